use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Internal numeric identifier of a row in `posts`.
pub type PostId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: i64,
    pub media_type: String,
    pub public_url: String,
    pub filename: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// A post as read from the store, with its media already joined in.
/// Posts are immutable once ingested; nothing in this service writes them.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: PostId,
    pub channel_name: String,
    pub channel_username: String,
    /// Sequence number assigned by the source channel.
    pub post_id: i64,
    pub date: DateTime<Utc>,
    pub text: Option<String>,
    pub has_photo: Option<bool>,
    pub has_video: Option<bool>,
    pub detected_language: Option<String>,
    pub media: Json<Vec<MediaItem>>,
}
