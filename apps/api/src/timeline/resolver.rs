//! Entity Name Resolver: turns a free-text name into a catalog identifier.
//!
//! Tiers run in order and each is tried only when the previous one found
//! nothing: exact (case-insensitive), partial (substring), alias. When several
//! rows tie inside a tier the lowest identifier wins; that choice is
//! implementation-defined, not a ranking.
//!
//! The alias tier sits behind `AliasMatcher`. The default `ScanAliasMatcher`
//! loads the whole master table and scans it in memory, which is linear in
//! catalog size; an indexed matcher can replace it without touching callers.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::errors::{QueryContext, QueryError};
use crate::models::entity::{AliasRow, EntityId, EntityKind};
use crate::timeline::store::TimelineStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Partial,
    Alias,
}

impl MatchTier {
    pub const CASCADE: [MatchTier; 3] = [MatchTier::Exact, MatchTier::Partial, MatchTier::Alias];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Partial => "partial",
            MatchTier::Alias => "alias",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: EntityId,
    pub tier: MatchTier,
}

// ────────────────────────────────────────────────────────────────────────────
// Alias tier
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait AliasMatcher: Send + Sync {
    async fn find_by_alias(&self, kind: EntityKind, name: &str) -> Result<Option<EntityId>>;
}

/// Full-table alias scan. The scan itself is CPU-bound and runs on the
/// blocking pool.
pub struct ScanAliasMatcher {
    store: Arc<dyn TimelineStore>,
}

impl ScanAliasMatcher {
    pub fn new(store: Arc<dyn TimelineStore>) -> Self {
        ScanAliasMatcher { store }
    }
}

#[async_trait]
impl AliasMatcher for ScanAliasMatcher {
    async fn find_by_alias(&self, kind: EntityKind, name: &str) -> Result<Option<EntityId>> {
        let catalog = self.store.load_aliases(kind).await?;
        let needle = name.to_lowercase();
        let found = tokio::task::spawn_blocking(move || scan_aliases(&catalog, &needle)).await?;
        Ok(found)
    }
}

/// First row with an alias that contains `needle` (already lowercased);
/// an alias equal to the needle trivially contains it.
pub fn scan_aliases(catalog: &[AliasRow], needle: &str) -> Option<EntityId> {
    catalog
        .iter()
        .find(|row| {
            row.aliases
                .iter()
                .flatten()
                .any(|alias| alias.to_lowercase().contains(needle))
        })
        .map(|row| row.id)
}

// ────────────────────────────────────────────────────────────────────────────
// Cascade
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct EntityNameResolver {
    store: Arc<dyn TimelineStore>,
    alias_matcher: Arc<dyn AliasMatcher>,
}

impl EntityNameResolver {
    pub fn new(store: Arc<dyn TimelineStore>, alias_matcher: Arc<dyn AliasMatcher>) -> Self {
        EntityNameResolver {
            store,
            alias_matcher,
        }
    }

    /// `Ok(None)` means no tier matched, which callers treat as a filter that
    /// matches zero posts. Store failures are errors, not misses.
    pub async fn resolve(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<Resolution>, QueryError> {
        for tier in MatchTier::CASCADE {
            let hit = match tier {
                MatchTier::Exact => self.store.find_entity_exact(kind, name).await,
                MatchTier::Partial => self.store.find_entity_partial(kind, name).await,
                MatchTier::Alias => self.alias_matcher.find_by_alias(kind, name).await,
            }
            .query_context(&format!("Failed to resolve {} name", kind.as_str()))?;

            if let Some(id) = hit {
                debug!(
                    "Resolved {} '{}' to {} via {} match",
                    kind.as_str(),
                    name,
                    id,
                    tier.as_str()
                );
                return Ok(Some(Resolution { id, tier }));
            }
        }

        debug!("No {} matches '{}'", kind.as_str(), name);
        Ok(None)
    }
}
