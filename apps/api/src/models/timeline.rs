use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::entity::{EntityId, LocationEntity, PostEntities};
use crate::models::post::{MediaItem, PostId};

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Raw caller parameters, exactly as they arrive on the query string.
/// Nothing here is trusted until it has been through `validate_timeline_params`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location_id: Option<String>,
    pub location_name: Option<String>,
    pub person_id: Option<String>,
    pub person_name: Option<String>,
    pub policy_id: Option<String>,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub channel: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TimelineParams {
    /// Treats `?channel=` and friends as if the key were missing.
    pub fn without_blank_values(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        TimelineParams {
            start_date: present(self.start_date),
            end_date: present(self.end_date),
            location_id: present(self.location_id),
            location_name: present(self.location_name),
            person_id: present(self.person_id),
            person_name: present(self.person_name),
            policy_id: present(self.policy_id),
            group_id: present(self.group_id),
            group_name: present(self.group_name),
            channel: present(self.channel),
            page: present(self.page),
            limit: present(self.limit),
        }
    }
}

/// Inclusive bounds on a post's timestamp. `start < end` and the span is at
/// most 365 days once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A filter on one entity kind: a catalog identifier, or a name that still
/// has to go through the resolution cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityFilter {
    ById(EntityId),
    ByName(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFilters {
    pub location: Option<EntityFilter>,
    pub person: Option<EntityFilter>,
    /// Policies can only be filtered by identifier.
    pub policy: Option<EntityId>,
    pub group: Option<EntityFilter>,
    /// Exact match on `posts.channel_username`.
    pub channel: Option<String>,
}

impl TimelineFilters {
    pub fn has_entity_filters(&self) -> bool {
        self.location.is_some()
            || self.person.is_some()
            || self.policy.is_some()
            || self.group.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-indexed.
    pub page: u32,
    /// Always within `[1, 100]`.
    pub limit: u32,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { page: 1, limit: 20 }
    }
}

/// Normalized parameters produced by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineQuery {
    pub date_range: DateRange,
    pub filters: TimelineFilters,
    pub pagination: Pagination,
}

// ────────────────────────────────────────────────────────────────────────────
// Response
// ────────────────────────────────────────────────────────────────────────────

/// A post flattened for the feed: its own fields, the primary location
/// lifted to the top level, and the full entity bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelinePost {
    pub id: PostId,
    pub post_id: i64,
    pub text: String,
    pub date: DateTime<Utc>,
    pub channel: String,
    pub channel_username: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    /// Canonical name of the primary location.
    pub country_code: Option<String>,
    pub has_photo: bool,
    pub has_video: bool,
    pub detected_language: Option<String>,
    pub media: Vec<MediaItem>,
    pub entities: PostEntities,
    #[serde(rename = "primaryLocation")]
    pub primary_location: Option<LocationEntity>,
    pub locations: Vec<LocationEntity>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineResponse {
    pub status: ResponseStatus,
    pub posts: Vec<TimelinePost>,
    pub count: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    pub page: u32,
    pub limit: u32,
}

impl TimelineResponse {
    pub fn empty(pagination: Pagination) -> Self {
        TimelineResponse {
            status: ResponseStatus::Success,
            posts: Vec::new(),
            count: 0,
            has_more: false,
            page: pagination.page,
            limit: pagination.limit,
        }
    }
}
