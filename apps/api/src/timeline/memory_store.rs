//! In-memory `TimelineStore` backing the unit tests. Honors the same ordering
//! contracts as `PgTimelineStore` and records every call it receives.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::types::Json;

use crate::models::entity::{
    AliasRow, CatalogLinkRow, EntityId, EntityKind, LocationLinkRow, PersonLinkRow,
};
use crate::models::post::{MediaItem, PostId, PostRow};
use crate::timeline::query::PostQuery;
use crate::timeline::store::TimelineStore;

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: EntityId,
    pub name: String,
    pub canonical_name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CatalogEntry {
    fn new(id: EntityId, name: &str, canonical: &str, aliases: &[&str]) -> Self {
        CatalogEntry {
            id,
            name: name.to_string(),
            canonical_name: Some(canonical.to_string()),
            aliases: if aliases.is_empty() {
                None
            } else {
                Some(aliases.iter().map(|a| a.to_string()).collect())
            },
            latitude: None,
            longitude: None,
        }
    }

    fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub posts: Vec<PostRow>,
    pub catalogs: HashMap<EntityKind, Vec<CatalogEntry>>,
    /// `(post_id, location_id, priority)`
    pub post_locations: Vec<(PostId, EntityId, i32)>,
    /// `(post_id, person_id, mentioned_as)`
    pub post_people: Vec<(PostId, EntityId, Option<String>)>,
    pub post_policies: Vec<(PostId, EntityId)>,
    pub post_groups: Vec<(PostId, EntityId)>,
    failing_on: Option<&'static str>,
    calls: Mutex<Vec<&'static str>>,
}

impl MemoryStore {
    /// Any call to `method` fails with a store-level error.
    pub fn failing_on(mut self, method: &'static str) -> Self {
        self.failing_on = Some(method);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| **m == method)
            .count()
    }

    fn record(&self, method: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(method);
        if self.failing_on == Some(method) {
            bail!("connection refused while running {method}");
        }
        Ok(())
    }

    fn catalog(&self, kind: EntityKind) -> &[CatalogEntry] {
        self.catalogs.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn entry(&self, kind: EntityKind, id: EntityId) -> Option<&CatalogEntry> {
        self.catalog(kind).iter().find(|e| e.id == id)
    }

    fn catalog_links(
        &self,
        kind: EntityKind,
        links: &[(PostId, EntityId)],
        post_ids: &[PostId],
    ) -> Vec<CatalogLinkRow> {
        links
            .iter()
            .filter(|(post_id, _)| post_ids.contains(post_id))
            .filter_map(|(post_id, id)| {
                self.entry(kind, *id).map(|e| CatalogLinkRow {
                    post_id: *post_id,
                    name: e.name.clone(),
                    canonical_name: e.canonical_name.clone(),
                    wikipedia_title: Some(e.name.clone()),
                    wikipedia_url: None,
                    wikipedia_page_id: None,
                })
            })
            .collect()
    }

    /// 45 posts, one every six hours from 2024-03-01, alternating between two
    /// channels; post 45 is the most recent. Catalog and links:
    ///
    /// - locations: 1 Kyiv (aliases Kiev, Київ), 2 Kharkiv Oblast, 3 Kharkiv,
    ///   4 Washington
    /// - people: 1 Volodymyr Zelensky (alias Zelenskyy), 2 Joe Biden
    /// - policies: 1 Sanctions, 2 Grain Deal
    /// - groups: 1 NATO (alias North Atlantic Treaty Organization), 2 Wagner Group
    /// - Kyiv: posts 1, 2, 3, 40; Zelensky: posts 1, 3, 5; Sanctions: 3, 7;
    ///   NATO: 3, 40
    pub fn fixture() -> Self {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let posts = (1..=45)
            .map(|id: PostId| {
                let channel = if id % 2 == 0 { "rybar" } else { "kyivindependent" };
                PostRow {
                    id,
                    channel_name: channel.to_uppercase(),
                    channel_username: channel.to_string(),
                    post_id: 1000 + id,
                    date: start + chrono::Duration::hours(6 * id),
                    text: Some(format!("**Update {id}**: [source](https://t.me/{channel}/{id})")),
                    has_photo: Some(id % 3 == 0),
                    has_video: None,
                    detected_language: Some("en".to_string()),
                    media: Json(if id == 3 {
                        vec![MediaItem {
                            id: 30,
                            media_type: "photo".to_string(),
                            public_url: "https://cdn.test/30.jpg".to_string(),
                            filename: Some("30.jpg".to_string()),
                            width: Some(1280),
                            height: Some(720),
                        }]
                    } else {
                        Vec::new()
                    }),
                }
            })
            .collect();

        let mut catalogs = HashMap::new();
        catalogs.insert(
            EntityKind::Location,
            vec![
                CatalogEntry::new(1, "Kyiv", "UA", &["Kiev", "Київ"]).at(50.4501, 30.5234),
                CatalogEntry::new(2, "Kharkiv Oblast", "UA", &[]).at(49.99, 36.23),
                CatalogEntry::new(3, "Kharkiv", "UA", &["Kharkov"]).at(49.9935, 36.2304),
                CatalogEntry::new(4, "Washington", "US", &["Washington, D.C."]).at(38.9072, -77.0369),
            ],
        );
        catalogs.insert(
            EntityKind::Person,
            vec![
                CatalogEntry::new(1, "Volodymyr Zelensky", "Volodymyr Zelenskyy", &["Zelenskyy"]),
                CatalogEntry::new(2, "Joe Biden", "Joseph R. Biden", &["Biden"]),
            ],
        );
        catalogs.insert(
            EntityKind::Policy,
            vec![
                CatalogEntry::new(1, "Sanctions", "Economic sanctions", &[]),
                CatalogEntry::new(2, "Grain Deal", "Black Sea Grain Initiative", &[]),
            ],
        );
        catalogs.insert(
            EntityKind::Group,
            vec![
                CatalogEntry::new(1, "NATO", "NATO", &["North Atlantic Treaty Organization"]),
                CatalogEntry::new(2, "Wagner Group", "Wagner Group", &[]),
            ],
        );

        MemoryStore {
            posts,
            catalogs,
            post_locations: vec![
                (1, 3, 1),
                (1, 1, 0),
                (2, 1, 0),
                (3, 1, 0),
                (3, 4, 2),
                (40, 4, 0),
                (40, 1, 1),
            ],
            post_people: vec![
                (1, 1, Some("Zelensky".to_string())),
                (3, 1, Some("Zelenskyy".to_string())),
                (5, 1, None),
                (40, 2, Some("Biden".to_string())),
            ],
            post_policies: vec![(3, 1), (7, 1)],
            post_groups: vec![(3, 1), (40, 1)],
            ..Default::default()
        }
    }
}

#[async_trait]
impl TimelineStore for MemoryStore {
    async fn find_entity_exact(&self, kind: EntityKind, name: &str) -> Result<Option<EntityId>> {
        self.record("find_entity_exact")?;
        let name = name.to_lowercase();
        Ok(self
            .catalog(kind)
            .iter()
            .filter(|e| e.name.to_lowercase() == name)
            .map(|e| e.id)
            .min())
    }

    async fn find_entity_partial(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<EntityId>> {
        self.record("find_entity_partial")?;
        let name = name.to_lowercase();
        Ok(self
            .catalog(kind)
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&name))
            .map(|e| e.id)
            .min())
    }

    async fn load_aliases(&self, kind: EntityKind) -> Result<Vec<AliasRow>> {
        self.record("load_aliases")?;
        let mut rows: Vec<AliasRow> = self
            .catalog(kind)
            .iter()
            .map(|e| AliasRow {
                id: e.id,
                aliases: e.aliases.clone(),
            })
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn post_ids_for_entity(&self, kind: EntityKind, id: EntityId) -> Result<Vec<PostId>> {
        self.record("post_ids_for_entity")?;
        let ids = match kind {
            EntityKind::Location => self
                .post_locations
                .iter()
                .filter(|(_, e, _)| *e == id)
                .map(|(p, _, _)| *p)
                .collect(),
            EntityKind::Person => self
                .post_people
                .iter()
                .filter(|(_, e, _)| *e == id)
                .map(|(p, _, _)| *p)
                .collect(),
            EntityKind::Policy => self
                .post_policies
                .iter()
                .filter(|(_, e)| *e == id)
                .map(|(p, _)| *p)
                .collect(),
            EntityKind::Group => self
                .post_groups
                .iter()
                .filter(|(_, e)| *e == id)
                .map(|(p, _)| *p)
                .collect(),
        };
        Ok(ids)
    }

    async fn fetch_posts(&self, query: &PostQuery) -> Result<Vec<PostRow>> {
        self.record("fetch_posts")?;
        let mut rows: Vec<PostRow> = self
            .posts
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        if let Some(window) = query.window {
            rows = rows
                .into_iter()
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .collect();
        }
        Ok(rows)
    }

    async fn location_links(&self, post_ids: &[PostId]) -> Result<Vec<LocationLinkRow>> {
        self.record("location_links")?;
        let mut rows: Vec<LocationLinkRow> = self
            .post_locations
            .iter()
            .filter(|(post_id, _, _)| post_ids.contains(post_id))
            .filter_map(|(post_id, location_id, priority)| {
                self.entry(EntityKind::Location, *location_id)
                    .map(|e| LocationLinkRow {
                        post_id: *post_id,
                        priority: *priority,
                        name: e.name.clone(),
                        latitude: e.latitude,
                        longitude: e.longitude,
                        canonical_name: e.canonical_name.clone(),
                        location_type: Some("city".to_string()),
                        location_subtype: None,
                        type_confidence: Some(0.95),
                        wikipedia_title: Some(e.name.clone()),
                        wikipedia_url: None,
                    })
            })
            .collect();
        rows.sort_by(|a, b| b.post_id.cmp(&a.post_id).then(a.priority.cmp(&b.priority)));
        Ok(rows)
    }

    async fn person_links(&self, post_ids: &[PostId]) -> Result<Vec<PersonLinkRow>> {
        self.record("person_links")?;
        Ok(self
            .post_people
            .iter()
            .filter(|(post_id, _, _)| post_ids.contains(post_id))
            .filter_map(|(post_id, person_id, mentioned_as)| {
                self.entry(EntityKind::Person, *person_id)
                    .map(|e| PersonLinkRow {
                        post_id: *post_id,
                        mentioned_as: mentioned_as.clone(),
                        name: e.name.clone(),
                        canonical_name: e.canonical_name.clone(),
                        title: None,
                        role: Some("head of state".to_string()),
                        wikipedia_title: Some(e.name.clone()),
                        wikipedia_url: None,
                        wikipedia_page_id: None,
                    })
            })
            .collect())
    }

    async fn policy_links(&self, post_ids: &[PostId]) -> Result<Vec<CatalogLinkRow>> {
        self.record("policy_links")?;
        Ok(self.catalog_links(EntityKind::Policy, &self.post_policies, post_ids))
    }

    async fn group_links(&self, post_ids: &[PostId]) -> Result<Vec<CatalogLinkRow>> {
        self.record("group_links")?;
        Ok(self.catalog_links(EntityKind::Group, &self.post_groups, post_ids))
    }
}
