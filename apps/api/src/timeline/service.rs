//! Timeline Service: validates a request, narrows it to eligible posts,
//! fetches one page and decorates every post with its entities.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::errors::{QueryContext, QueryError, TimelineError};
use crate::models::post::{PostId, PostRow};
use crate::models::timeline::{
    ResponseStatus, TimelineParams, TimelinePost, TimelineQuery, TimelineResponse,
};
use crate::timeline::aggregator::{fetch_post_entities, PostEntityMaps};
use crate::timeline::filter::EntityFilterResolver;
use crate::timeline::query::build_base_query;
use crate::timeline::resolver::{AliasMatcher, EntityNameResolver, ScanAliasMatcher};
use crate::timeline::sanitize::strip_telegram_formatting;
use crate::timeline::store::TimelineStore;
use crate::timeline::validation::validate_timeline_params;

#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineSettings {
    /// Fetch one row past the page so `hasMore` is exact. Off by default:
    /// `hasMore` is then `count == limit`, which reports a full last page as
    /// having more.
    pub exact_has_more: bool,
}

#[derive(Clone)]
pub struct TimelineService {
    store: Arc<dyn TimelineStore>,
    filters: EntityFilterResolver,
    settings: TimelineSettings,
}

impl TimelineService {
    /// Uses the full-table alias scan for the alias tier.
    pub fn new(store: Arc<dyn TimelineStore>, settings: TimelineSettings) -> Self {
        let alias_matcher: Arc<dyn AliasMatcher> = Arc::new(ScanAliasMatcher::new(store.clone()));
        Self::with_alias_matcher(store, alias_matcher, settings)
    }

    pub fn with_alias_matcher(
        store: Arc<dyn TimelineStore>,
        alias_matcher: Arc<dyn AliasMatcher>,
        settings: TimelineSettings,
    ) -> Self {
        let names = EntityNameResolver::new(store.clone(), alias_matcher);
        TimelineService {
            filters: EntityFilterResolver::new(store.clone(), names),
            store,
            settings,
        }
    }

    /// Validation failures are raised before the store is touched.
    pub async fn get_timeline_posts(
        &self,
        params: &TimelineParams,
    ) -> Result<TimelineResponse, TimelineError> {
        let query = validate_timeline_params(params)?;
        Ok(self.run_query(&query).await?)
    }

    /// Runs an already-validated query.
    pub async fn run_query(&self, query: &TimelineQuery) -> Result<TimelineResponse, QueryError> {
        let started = Instant::now();
        let pagination = query.pagination;

        let eligible = self.filters.resolve_post_ids(&query.filters).await?;
        if let Some(ids) = &eligible {
            if ids.is_empty() {
                info!("Timeline query: no posts match the entity filters");
                return Ok(TimelineResponse::empty(pagination));
            }
        }

        let mut post_query = build_base_query()
            .with_date_range(&query.date_range)
            .with_channel(query.filters.channel.as_deref());
        if let Some(ids) = &eligible {
            post_query = post_query.restrict_to(ids);
        }
        post_query = post_query.paginate(&pagination);
        if self.settings.exact_has_more {
            post_query = post_query.with_lookahead_row();
        }

        let mut rows = self
            .store
            .fetch_posts(&post_query)
            .await
            .query_context("Failed to fetch posts")?;

        let limit = pagination.limit as usize;
        let has_more = if self.settings.exact_has_more {
            let more = rows.len() > limit;
            rows.truncate(limit);
            more
        } else {
            rows.len() == limit
        };

        if rows.is_empty() {
            info!("Timeline query: no posts on page {}", pagination.page);
            return Ok(TimelineResponse::empty(pagination));
        }

        let post_ids: Vec<PostId> = rows.iter().map(|row| row.id).collect();
        let maps = fetch_post_entities(self.store.as_ref(), &post_ids).await?;

        let posts: Vec<TimelinePost> = rows
            .into_iter()
            .map(|row| assemble_post(row, &maps))
            .collect();

        info!(
            "Timeline query: {} posts (page {}, limit {}, hasMore {}) in {}ms",
            posts.len(),
            pagination.page,
            pagination.limit,
            has_more,
            started.elapsed().as_millis()
        );

        Ok(TimelineResponse {
            status: ResponseStatus::Success,
            count: posts.len(),
            posts,
            has_more,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}

/// Flattens the primary location onto the post and attaches the bundle.
fn assemble_post(row: PostRow, maps: &PostEntityMaps) -> TimelinePost {
    let primary = maps.primary_location_for(row.id);

    TimelinePost {
        id: row.id,
        post_id: row.post_id,
        text: strip_telegram_formatting(row.text.as_deref()),
        date: row.date,
        channel: row.channel_name,
        channel_username: row.channel_username,
        latitude: primary.as_ref().and_then(|l| l.latitude),
        longitude: primary.as_ref().and_then(|l| l.longitude),
        location_name: primary.as_ref().map(|l| l.name.clone()),
        country_code: primary.as_ref().and_then(|l| l.canonical_name.clone()),
        has_photo: row.has_photo.unwrap_or(false),
        has_video: row.has_video.unwrap_or(false),
        detected_language: row.detected_language,
        media: row.media.0,
        entities: maps.entities_for(row.id),
        locations: maps.locations_for(row.id),
        primary_location: primary,
    }
}
