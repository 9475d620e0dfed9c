//! Entity Aggregator: fetches the four junction relations for a page of posts
//! and reshapes them into per-post maps.

use std::collections::HashMap;

use crate::errors::{QueryContext, QueryError};
use crate::models::entity::{
    CatalogLinkRow, LocationEntity, LocationLinkRow, PersonLinkRow, PostEntities,
};
use crate::models::post::PostId;
use crate::timeline::store::TimelineStore;

#[derive(Debug, Default)]
pub struct PostEntityMaps {
    /// Ascending by priority.
    pub locations_by_post: HashMap<PostId, Vec<LocationEntity>>,
    /// Absent for posts with no linked location.
    pub primary_location_by_post: HashMap<PostId, LocationEntity>,
    pub entities_by_post: HashMap<PostId, PostEntities>,
}

impl PostEntityMaps {
    pub fn locations_for(&self, post_id: PostId) -> Vec<LocationEntity> {
        self.locations_by_post
            .get(&post_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn primary_location_for(&self, post_id: PostId) -> Option<LocationEntity> {
        self.primary_location_by_post.get(&post_id).cloned()
    }

    pub fn entities_for(&self, post_id: PostId) -> PostEntities {
        self.entities_by_post
            .get(&post_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Fetches and groups every entity linked to `post_ids`. The four fetches
/// run concurrently; an empty batch issues none.
pub async fn fetch_post_entities(
    store: &dyn TimelineStore,
    post_ids: &[PostId],
) -> Result<PostEntityMaps, QueryError> {
    if post_ids.is_empty() {
        return Ok(PostEntityMaps::default());
    }

    let (locations, people, policies, groups) = tokio::try_join!(
        async {
            store
                .location_links(post_ids)
                .await
                .query_context("Failed to fetch location data")
        },
        async {
            store
                .person_links(post_ids)
                .await
                .query_context("Failed to fetch people data")
        },
        async {
            store
                .policy_links(post_ids)
                .await
                .query_context("Failed to fetch policies data")
        },
        async {
            store
                .group_links(post_ids)
                .await
                .query_context("Failed to fetch groups data")
        },
    )?;

    Ok(group_entities_by_post(locations, people, policies, groups))
}

/// Builds the per-post maps in one pass per relation.
///
/// `locations` must arrive ordered by `(post_id DESC, priority ASC)`: the first
/// row seen for a post becomes its primary location. Locations are copied into
/// the entity bundle as well, so the bundle carries every kind uniformly.
pub fn group_entities_by_post(
    locations: Vec<LocationLinkRow>,
    people: Vec<PersonLinkRow>,
    policies: Vec<CatalogLinkRow>,
    groups: Vec<CatalogLinkRow>,
) -> PostEntityMaps {
    let mut maps = PostEntityMaps::default();

    for row in &locations {
        let entry = row.to_entity();
        match maps.locations_by_post.get_mut(&row.post_id) {
            Some(list) => list.push(entry),
            None => {
                maps.primary_location_by_post
                    .insert(row.post_id, entry.clone());
                maps.locations_by_post.insert(row.post_id, vec![entry]);
            }
        }
    }

    let bundles = &mut maps.entities_by_post;
    for row in people {
        bundles.entry(row.post_id).or_default().people.push(row.into());
    }
    for row in &locations {
        bundles
            .entry(row.post_id)
            .or_default()
            .locations
            .push(row.to_entity());
    }
    for row in policies {
        bundles
            .entry(row.post_id)
            .or_default()
            .policies
            .push(row.into());
    }
    for row in groups {
        bundles.entry(row.post_id).or_default().groups.push(row.into());
    }

    maps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::memory_store::MemoryStore;

    fn location(post_id: PostId, priority: i32, name: &str) -> LocationLinkRow {
        LocationLinkRow {
            post_id,
            priority,
            name: name.to_string(),
            latitude: Some(50.45),
            longitude: Some(30.52),
            canonical_name: Some("UA".to_string()),
            location_type: Some("city".to_string()),
            location_subtype: None,
            type_confidence: Some(0.9),
            wikipedia_title: None,
            wikipedia_url: None,
        }
    }

    fn catalog(post_id: PostId, name: &str) -> CatalogLinkRow {
        CatalogLinkRow {
            post_id,
            name: name.to_string(),
            canonical_name: None,
            wikipedia_title: Some(name.to_string()),
            wikipedia_url: None,
            wikipedia_page_id: Some(7),
        }
    }

    #[test]
    fn test_first_row_per_post_is_primary() {
        let maps = group_entities_by_post(
            vec![
                location(9, 0, "Kyiv"),
                location(9, 2, "Bucha"),
                location(4, 1, "Odesa"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(maps.primary_location_for(9).unwrap().name, "Kyiv");
        let names: Vec<_> = maps.locations_for(9).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Kyiv", "Bucha"]);
        assert_eq!(maps.primary_location_for(4).unwrap().priority, 1);
    }

    #[test]
    fn test_post_without_locations() {
        let maps = group_entities_by_post(
            Vec::new(),
            Vec::new(),
            vec![catalog(3, "Sanctions")],
            Vec::new(),
        );
        assert!(maps.primary_location_for(3).is_none());
        assert!(maps.locations_for(3).is_empty());

        let bundle = maps.entities_for(3);
        assert_eq!(bundle.policies.len(), 1);
        assert!(bundle.people.is_empty() && bundle.locations.is_empty() && bundle.groups.is_empty());
    }

    #[test]
    fn test_bundle_carries_locations_too() {
        let maps = group_entities_by_post(
            vec![location(1, 0, "Kyiv")],
            Vec::new(),
            Vec::new(),
            vec![catalog(1, "NATO")],
        );
        let bundle = maps.entities_for(1);
        assert_eq!(bundle.locations, maps.locations_for(1));
        assert_eq!(bundle.groups[0].name, "NATO");
    }

    #[test]
    fn test_unknown_post_gets_empty_bundle() {
        let maps = PostEntityMaps::default();
        assert_eq!(maps.entities_for(99), PostEntities::default());
    }

    #[tokio::test]
    async fn test_empty_batch_issues_no_fetch() {
        let store = MemoryStore::fixture();
        let maps = fetch_post_entities(&store, &[]).await.unwrap();
        assert!(maps.entities_by_post.is_empty());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_groups_all_four_relations() {
        let store = MemoryStore::fixture();
        let maps = fetch_post_entities(&store, &[1, 3]).await.unwrap();

        // Post 1 links Kyiv at priority 0 and Kharkiv at priority 1.
        assert_eq!(maps.primary_location_for(1).unwrap().name, "Kyiv");
        assert_eq!(maps.locations_for(1).len(), 2);

        let bundle = maps.entities_for(3);
        assert_eq!(bundle.people.len(), 1);
        assert_eq!(bundle.people[0].mentioned_as.as_deref(), Some("Zelenskyy"));
        assert_eq!(bundle.policies.len(), 1);
        assert_eq!(store.call_count(), 4);
    }

    #[tokio::test]
    async fn test_relation_failure_is_wrapped() {
        let store = MemoryStore::fixture().failing_on("group_links");
        let err = fetch_post_entities(&store, &[1]).await.unwrap_err();
        assert_eq!(err.message, "Failed to fetch groups data");
    }
}
