//! The read-only view of the backing store the timeline engine depends on.
//!
//! `TimelineService` holds an `Arc<dyn TimelineStore>`; production wires in
//! `PgTimelineStore`, tests an in-memory catalog.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::entity::{
    AliasRow, CatalogLinkRow, EntityId, EntityKind, LocationLinkRow, PersonLinkRow,
};
use crate::models::post::{PostId, PostRow};
use crate::timeline::query::PostQuery;

#[async_trait]
pub trait TimelineStore: Send + Sync {
    /// Case-insensitive equality on the kind's display-name column.
    async fn find_entity_exact(&self, kind: EntityKind, name: &str) -> Result<Option<EntityId>>;

    /// Case-insensitive "display name contains `name`".
    async fn find_entity_partial(&self, kind: EntityKind, name: &str)
        -> Result<Option<EntityId>>;

    /// Every row of the kind's master table with its alias list, unfiltered.
    async fn load_aliases(&self, kind: EntityKind) -> Result<Vec<AliasRow>>;

    /// Post identifiers linked to one catalog entry through the kind's junction.
    async fn post_ids_for_entity(&self, kind: EntityKind, id: EntityId) -> Result<Vec<PostId>>;

    async fn fetch_posts(&self, query: &PostQuery) -> Result<Vec<PostRow>>;

    /// Location links for the batch, ordered by `(post_id DESC, priority ASC)`.
    async fn location_links(&self, post_ids: &[PostId]) -> Result<Vec<LocationLinkRow>>;

    async fn person_links(&self, post_ids: &[PostId]) -> Result<Vec<PersonLinkRow>>;

    async fn policy_links(&self, post_ids: &[PostId]) -> Result<Vec<CatalogLinkRow>>;

    async fn group_links(&self, post_ids: &[PostId]) -> Result<Vec<CatalogLinkRow>>;
}
