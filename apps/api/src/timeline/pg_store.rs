use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::entity::{
    AliasRow, CatalogLinkRow, EntityId, EntityKind, LocationLinkRow, PersonLinkRow,
};
use crate::models::post::{PostId, PostRow};
use crate::timeline::query::PostQuery;
use crate::timeline::store::TimelineStore;

/// `TimelineStore` over the Postgres schema. Table and column names come from
/// `EntityKind`'s static mapping, never from caller input.
#[derive(Clone)]
pub struct PgTimelineStore {
    pool: PgPool,
}

impl PgTimelineStore {
    pub fn new(pool: PgPool) -> Self {
        PgTimelineStore { pool }
    }
}

/// Escapes `%`, `_` and `\` so `name` matches literally inside `ILIKE`.
pub fn escape_like(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl TimelineStore for PgTimelineStore {
    async fn find_entity_exact(&self, kind: EntityKind, name: &str) -> Result<Option<EntityId>> {
        let sql = format!(
            "SELECT id FROM {table} WHERE lower({col}) = lower($1) ORDER BY id LIMIT 1",
            table = kind.master_table(),
            col = kind.name_column(),
        );
        let id = sqlx::query_scalar::<_, EntityId>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_entity_partial(
        &self,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<EntityId>> {
        let sql = format!(
            r"SELECT id FROM {table} WHERE {col} ILIKE $1 ESCAPE '\' ORDER BY id LIMIT 1",
            table = kind.master_table(),
            col = kind.name_column(),
        );
        let id = sqlx::query_scalar::<_, EntityId>(&sql)
            .bind(format!("%{}%", escape_like(name)))
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn load_aliases(&self, kind: EntityKind) -> Result<Vec<AliasRow>> {
        let sql = format!(
            "SELECT id, aliases FROM {table} ORDER BY id",
            table = kind.master_table(),
        );
        let rows = sqlx::query_as::<_, AliasRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn post_ids_for_entity(&self, kind: EntityKind, id: EntityId) -> Result<Vec<PostId>> {
        let sql = format!(
            "SELECT post_id FROM {table} WHERE {col} = $1",
            table = kind.junction_table(),
            col = kind.junction_column(),
        );
        let ids = sqlx::query_scalar::<_, PostId>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn fetch_posts(&self, query: &PostQuery) -> Result<Vec<PostRow>> {
        let mut qb = query.to_query_builder();
        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn location_links(&self, post_ids: &[PostId]) -> Result<Vec<LocationLinkRow>> {
        let rows = sqlx::query_as::<_, LocationLinkRow>(
            r#"
            SELECT
                pl.post_id,
                pl.priority::int4 AS priority,
                lm.name,
                lm.latitude::float8 AS latitude,
                lm.longitude::float8 AS longitude,
                lm.canonical_name,
                lm.location_type,
                lm.location_subtype,
                lm.type_confidence::float8 AS type_confidence,
                lm.wikipedia_title,
                lm.wikipedia_url
            FROM post_locations pl
            JOIN locations_master lm ON lm.id = pl.location_id
            WHERE pl.post_id = ANY($1)
            ORDER BY pl.post_id DESC, pl.priority ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn person_links(&self, post_ids: &[PostId]) -> Result<Vec<PersonLinkRow>> {
        let rows = sqlx::query_as::<_, PersonLinkRow>(
            r#"
            SELECT
                pp.post_id,
                pp.mentioned_as,
                pm.name,
                pm.canonical_name,
                pm.title,
                pm.role,
                pm.wikipedia_title,
                pm.wikipedia_url,
                pm.wikipedia_page_id::int8 AS wikipedia_page_id
            FROM post_people pp
            JOIN people_master pm ON pm.id = pp.person_id
            WHERE pp.post_id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn policy_links(&self, post_ids: &[PostId]) -> Result<Vec<CatalogLinkRow>> {
        let rows = sqlx::query_as::<_, CatalogLinkRow>(
            r#"
            SELECT
                pp.post_id,
                pm.policy_name AS name,
                pm.canonical_name,
                pm.wikipedia_title,
                pm.wikipedia_url,
                pm.wikipedia_page_id::int8 AS wikipedia_page_id
            FROM post_policies pp
            JOIN policies_master pm ON pm.id = pp.policy_id
            WHERE pp.post_id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn group_links(&self, post_ids: &[PostId]) -> Result<Vec<CatalogLinkRow>> {
        let rows = sqlx::query_as::<_, CatalogLinkRow>(
            r#"
            SELECT
                pg.post_id,
                gm.group_name AS name,
                gm.canonical_name,
                gm.wikipedia_title,
                gm.wikipedia_url,
                gm.wikipedia_page_id::int8 AS wikipedia_page_id
            FROM post_groups pg
            JOIN groups_master gm ON gm.id = pg.group_id
            WHERE pg.post_id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
