//! Timeline engine: resolves entity filters, pages through posts and
//! decorates each post with the entities it mentions.
//!
//! ```text
//! validation ─► filter ─► resolver ─► query ─► store ─► aggregator ─► sanitize
//!                 (names → ids)      (page)           (entities)     (text)
//! ```
//!
//! Everything talks to the backing store through `TimelineStore`, so the
//! whole pipeline runs unchanged against Postgres or the in-memory test store.

pub mod aggregator;
pub mod filter;
pub mod handlers;
pub mod pg_store;
pub mod query;
pub mod resolver;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod memory_store;
