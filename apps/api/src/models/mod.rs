pub mod entity;
pub mod post;
pub mod timeline;
