use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::post::PostId;

/// Identifier of a row in one of the `*_master` catalogs.
pub type EntityId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Location,
    Person,
    Policy,
    Group,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Location => "location",
            EntityKind::Person => "person",
            EntityKind::Policy => "policy",
            EntityKind::Group => "group",
        }
    }

    pub fn master_table(&self) -> &'static str {
        match self {
            EntityKind::Location => "locations_master",
            EntityKind::Person => "people_master",
            EntityKind::Policy => "policies_master",
            EntityKind::Group => "groups_master",
        }
    }

    /// Display-name column searched by the exact and partial tiers.
    pub fn name_column(&self) -> &'static str {
        match self {
            EntityKind::Location | EntityKind::Person => "name",
            EntityKind::Policy => "policy_name",
            EntityKind::Group => "group_name",
        }
    }

    pub fn junction_table(&self) -> &'static str {
        match self {
            EntityKind::Location => "post_locations",
            EntityKind::Person => "post_people",
            EntityKind::Policy => "post_policies",
            EntityKind::Group => "post_groups",
        }
    }

    pub fn junction_column(&self) -> &'static str {
        match self {
            EntityKind::Location => "location_id",
            EntityKind::Person => "person_id",
            EntityKind::Policy => "policy_id",
            EntityKind::Group => "group_id",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire entities (shape consumed by the metadata panel)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationEntity {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: Option<String>,
    pub location_subtype: Option<String>,
    pub type_confidence: Option<f64>,
    pub canonical_name: Option<String>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonEntity {
    pub name: String,
    pub mentioned_as: Option<String>,
    pub canonical_name: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikipedia_page_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyEntity {
    pub name: String,
    pub canonical_name: Option<String>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikipedia_page_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupEntity {
    pub name: String,
    pub canonical_name: Option<String>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikipedia_page_id: Option<i64>,
}

/// Every entity mentioned by one post, grouped by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostEntities {
    pub people: Vec<PersonEntity>,
    pub locations: Vec<LocationEntity>,
    pub policies: Vec<PolicyEntity>,
    pub groups: Vec<GroupEntity>,
}

// ────────────────────────────────────────────────────────────────────────────
// Junction rows joined to their master table
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
pub struct LocationLinkRow {
    pub post_id: PostId,
    pub priority: i32,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub canonical_name: Option<String>,
    pub location_type: Option<String>,
    pub location_subtype: Option<String>,
    pub type_confidence: Option<f64>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
}

impl LocationLinkRow {
    pub fn to_entity(&self) -> LocationEntity {
        LocationEntity {
            name: self.name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            location_type: self.location_type.clone(),
            location_subtype: self.location_subtype.clone(),
            type_confidence: self.type_confidence,
            canonical_name: self.canonical_name.clone(),
            wikipedia_title: self.wikipedia_title.clone(),
            wikipedia_url: self.wikipedia_url.clone(),
            priority: self.priority,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PersonLinkRow {
    pub post_id: PostId,
    pub mentioned_as: Option<String>,
    pub name: String,
    pub canonical_name: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikipedia_page_id: Option<i64>,
}

impl From<PersonLinkRow> for PersonEntity {
    fn from(row: PersonLinkRow) -> Self {
        PersonEntity {
            name: row.name,
            mentioned_as: row.mentioned_as,
            canonical_name: row.canonical_name,
            title: row.title,
            role: row.role,
            wikipedia_title: row.wikipedia_title,
            wikipedia_url: row.wikipedia_url,
            wikipedia_page_id: row.wikipedia_page_id,
        }
    }
}

/// Policy and group links share one shape; only the master table differs.
#[derive(Debug, Clone, FromRow)]
pub struct CatalogLinkRow {
    pub post_id: PostId,
    pub name: String,
    pub canonical_name: Option<String>,
    pub wikipedia_title: Option<String>,
    pub wikipedia_url: Option<String>,
    pub wikipedia_page_id: Option<i64>,
}

impl From<CatalogLinkRow> for PolicyEntity {
    fn from(row: CatalogLinkRow) -> Self {
        PolicyEntity {
            name: row.name,
            canonical_name: row.canonical_name,
            wikipedia_title: row.wikipedia_title,
            wikipedia_url: row.wikipedia_url,
            wikipedia_page_id: row.wikipedia_page_id,
        }
    }
}

impl From<CatalogLinkRow> for GroupEntity {
    fn from(row: CatalogLinkRow) -> Self {
        GroupEntity {
            name: row.name,
            canonical_name: row.canonical_name,
            wikipedia_title: row.wikipedia_title,
            wikipedia_url: row.wikipedia_url,
            wikipedia_page_id: row.wikipedia_page_id,
        }
    }
}

/// One catalog row as seen by the alias tier.
#[derive(Debug, Clone, FromRow)]
pub struct AliasRow {
    pub id: EntityId,
    pub aliases: Option<Vec<String>>,
}
