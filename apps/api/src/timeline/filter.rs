//! Multi-Entity Filter Resolver: the set of posts linked to every active
//! entity filter.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::errors::{QueryContext, QueryError};
use crate::models::entity::{EntityId, EntityKind};
use crate::models::post::PostId;
use crate::models::timeline::{EntityFilter, TimelineFilters};
use crate::timeline::resolver::EntityNameResolver;
use crate::timeline::store::TimelineStore;

#[derive(Clone)]
pub struct EntityFilterResolver {
    store: Arc<dyn TimelineStore>,
    names: EntityNameResolver,
}

impl EntityFilterResolver {
    pub fn new(store: Arc<dyn TimelineStore>, names: EntityNameResolver) -> Self {
        EntityFilterResolver { store, names }
    }

    /// Returns `None` when no entity filter is active (do not restrict), or
    /// the intersection of every filter's post set, possibly empty.
    ///
    /// A name that resolves to nothing short-circuits to `Some(vec![])`
    /// without fetching any junction rows.
    pub async fn resolve_post_ids(
        &self,
        filters: &TimelineFilters,
    ) -> Result<Option<Vec<PostId>>, QueryError> {
        if !filters.has_entity_filters() {
            return Ok(None);
        }

        let mut targets: Vec<(EntityKind, EntityId)> = Vec::with_capacity(4);

        let named = [
            (EntityKind::Location, &filters.location),
            (EntityKind::Person, &filters.person),
            (EntityKind::Group, &filters.group),
        ];
        for (kind, filter) in named {
            match filter {
                Some(EntityFilter::ById(id)) => targets.push((kind, *id)),
                Some(EntityFilter::ByName(name)) => match self.names.resolve(kind, name).await? {
                    Some(resolution) => targets.push((kind, resolution.id)),
                    None => return Ok(Some(Vec::new())),
                },
                None => {}
            }
        }
        if let Some(id) = filters.policy {
            targets.push((EntityKind::Policy, id));
        }

        let sets = try_join_all(
            targets
                .iter()
                .map(|(kind, id)| self.store.post_ids_for_entity(*kind, *id)),
        )
        .await
        .query_context("Failed to fetch post IDs for entity filter")?;

        let eligible = intersect_post_ids(sets);
        debug!(
            "Entity filters {:?} matched {} posts",
            targets,
            eligible.len()
        );
        Ok(Some(eligible))
    }
}

/// Intersects the sets pairwise, starting from the first. Output is ascending.
pub fn intersect_post_ids(sets: Vec<Vec<PostId>>) -> Vec<PostId> {
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return Vec::new();
    };

    let mut intersection: BTreeSet<PostId> = first.into_iter().collect();
    for set in sets {
        let other: BTreeSet<PostId> = set.into_iter().collect();
        intersection.retain(|id| other.contains(id));
    }
    intersection.into_iter().collect()
}
