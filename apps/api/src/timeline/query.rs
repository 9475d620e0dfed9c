//! Query Composer: builds the post-selection query from independent fragments.
//!
//! Each fragment narrows a `PostQuery`; `to_query_builder` renders the result
//! for Postgres. Test builds also get `matches`, the same predicate in memory.

use sqlx::{Postgres, QueryBuilder};

use crate::models::post::PostId;
use crate::models::timeline::{DateRange, Pagination};

const BASE_SELECT: &str = r#"
SELECT
    p.id,
    p.channel_name,
    p.channel_username,
    p.post_id,
    p.date,
    p.text,
    p.has_photo,
    p.has_video,
    p.detected_language,
    COALESCE(
        (
            SELECT json_agg(
                json_build_object(
                    'id', m.id,
                    'media_type', m.media_type,
                    'public_url', m.public_url,
                    'filename', m.filename,
                    'width', m.width,
                    'height', m.height
                )
                ORDER BY m.id
            )
            FROM media m
            WHERE m.post_id = p.id
        ),
        '[]'::json
    ) AS media
FROM posts p
WHERE TRUE"#;

/// Row window applied after ordering by `date DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    pub date_range: Option<DateRange>,
    pub channel: Option<String>,
    pub post_ids: Option<Vec<PostId>>,
    pub window: Option<PageWindow>,
}

/// Posts with their media, unfiltered and unpaginated.
pub fn build_base_query() -> PostQuery {
    PostQuery::default()
}

impl PostQuery {
    /// Inclusive on both ends.
    pub fn with_date_range(mut self, range: &DateRange) -> Self {
        self.date_range = Some(*range);
        self
    }

    /// Exact match on `channel_username`; `None` leaves the query untouched.
    pub fn with_channel(mut self, channel: Option<&str>) -> Self {
        if let Some(channel) = channel {
            self.channel = Some(channel.to_string());
        }
        self
    }

    /// Keeps only posts whose identifier is in `ids`. Callers short-circuit an
    /// empty restriction instead of issuing the query.
    pub fn restrict_to(mut self, ids: &[PostId]) -> Self {
        self.post_ids = Some(ids.to_vec());
        self
    }

    pub fn paginate(mut self, pagination: &Pagination) -> Self {
        self.window = Some(PageWindow {
            offset: pagination.offset(),
            limit: i64::from(pagination.limit),
        });
        self
    }

    /// Asks for one row past the page so the caller can tell whether more exist.
    pub fn with_lookahead_row(mut self) -> Self {
        if let Some(window) = self.window.as_mut() {
            window.limit += 1;
        }
        self
    }

    /// The filtering half of the query, evaluated against a single row.
    /// Only the in-memory store needs it.
    #[cfg(test)]
    pub fn matches(&self, post: &crate::models::post::PostRow) -> bool {
        if let Some(range) = &self.date_range {
            if post.date < range.start || post.date > range.end {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if &post.channel_username != channel {
                return false;
            }
        }
        if let Some(ids) = &self.post_ids {
            if !ids.contains(&post.id) {
                return false;
            }
        }
        true
    }

    pub fn to_query_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(BASE_SELECT);

        if let Some(range) = &self.date_range {
            qb.push(" AND p.date >= ");
            qb.push_bind(range.start);
            qb.push(" AND p.date <= ");
            qb.push_bind(range.end);
        }
        if let Some(channel) = &self.channel {
            qb.push(" AND p.channel_username = ");
            qb.push_bind(channel.clone());
        }
        if let Some(ids) = &self.post_ids {
            qb.push(" AND p.id = ANY(");
            qb.push_bind(ids.clone());
            qb.push(")");
        }

        // Secondary key keeps pages disjoint when timestamps tie.
        qb.push(" ORDER BY p.date DESC, p.id DESC");

        if let Some(window) = &self.window {
            qb.push(" LIMIT ");
            qb.push_bind(window.limit);
            qb.push(" OFFSET ");
            qb.push_bind(window.offset);
        }

        qb
    }
}
