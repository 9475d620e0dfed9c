use crate::timeline::service::TimelineService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backed by `PgTimelineStore` in production; the store is held as
    /// `Arc<dyn TimelineStore>` inside the service.
    pub timeline: TimelineService,
}
