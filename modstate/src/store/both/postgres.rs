use modstate_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, ModstateResult};
use crate::store::entity::EntityStore;
use crate::store::moderation::ModerationStateStore;
use crate::types::{
    ContentEntity, EntityId, ModerationStateRecord, NODE_ENTITY_TYPE, RecordId, RecordKey,
    SaveOutcome,
};

/// Schema owning the moderation state table, created by the rebuild migrations.
pub const MODSTATE_SCHEMA: &str = "modstate";

/// Minimum number of pooled connections.
const MIN_POOL_CONNECTIONS: u32 = 1;

/// Maximum number of pooled connections. The rebuild issues one query at a time.
const MAX_POOL_CONNECTIONS: u32 = 2;

/// Connects to the database described by `config`.
pub async fn connect_to_database(
    config: &PgConnectionConfig,
    min_connections: u32,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options: PgConnectOptions = config.with_db();

    PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

#[derive(Debug, FromRow)]
struct NodeRow {
    nid: i64,
    vid: i64,
    bundle: String,
    langcode: String,
    uid: i64,
    published: bool,
}

impl TryFrom<NodeRow> for ContentEntity {
    type Error = crate::error::ModstateError;

    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        Ok(ContentEntity {
            id: EntityId::new(to_unsigned(row.nid, "nid")?),
            entity_type: NODE_ENTITY_TYPE.to_string(),
            bundle: row.bundle,
            owner_id: to_unsigned(row.uid, "uid")?,
            revision_id: to_unsigned(row.vid, "vid")?,
            langcode: row.langcode,
            published: row.published,
        })
    }
}

#[derive(Debug, FromRow)]
struct ModerationStateRow {
    id: i64,
    content_entity_type_id: String,
    content_entity_id: i64,
    content_entity_revision_id: i64,
    langcode: String,
    workflow: String,
    moderation_state: String,
    uid: i64,
}

impl TryFrom<ModerationStateRow> for ModerationStateRecord {
    type Error = crate::error::ModstateError;

    fn try_from(row: ModerationStateRow) -> Result<Self, Self::Error> {
        Ok(ModerationStateRecord {
            id: Some(RecordId::new(to_unsigned(row.id, "id")?)),
            content_entity_type_id: row.content_entity_type_id,
            content_entity_id: EntityId::new(to_unsigned(row.content_entity_id, "content_entity_id")?),
            content_entity_revision_id: to_unsigned(
                row.content_entity_revision_id,
                "content_entity_revision_id",
            )?,
            langcode: row.langcode,
            workflow: row.workflow,
            moderation_state: row.moderation_state,
            owner_id: to_unsigned(row.uid, "uid")?,
        })
    }
}

fn to_unsigned(value: i64, column: &str) -> ModstateResult<u64> {
    match u64::try_from(value) {
        Ok(value) => Ok(value),
        Err(_) => bail!(
            ErrorKind::ConversionError,
            "Negative identifier read from the database",
            format!("column `{column}` holds {value}")
        ),
    }
}

fn to_signed(value: u64, column: &str) -> ModstateResult<i64> {
    match i64::try_from(value) {
        Ok(value) => Ok(value),
        Err(_) => bail!(
            ErrorKind::ConversionError,
            "Identifier does not fit in a Postgres bigint",
            format!("`{column}` is {value}")
        ),
    }
}

/// Postgres-backed store reading nodes from the content tables and keeping moderation state
/// records in `modstate.content_moderation_state`.
///
/// Nodes are read from `node_field_data`, using the default translation of each node. The
/// moderation state table carries a unique index on the record key, so a concurrent writer
/// racing the rebuild surfaces as [`ErrorKind::DuplicateStateRecord`] for that entity.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to the database described by `config`.
    pub async fn connect(config: &PgConnectionConfig) -> ModstateResult<Self> {
        let pool = connect_to_database(config, MIN_POOL_CONNECTIONS, MAX_POOL_CONNECTIONS).await?;

        Ok(Self::new(pool))
    }

    async fn insert_record(&self, record: &mut ModerationStateRecord) -> ModstateResult<()> {
        let id: i64 = sqlx::query_scalar(
            r#"
            insert into modstate.content_moderation_state
                (content_entity_type_id, content_entity_id, content_entity_revision_id,
                 langcode, workflow, moderation_state, uid)
            values ($1, $2, $3, $4, $5, $6, $7)
            returning id
            "#,
        )
        .bind(&record.content_entity_type_id)
        .bind(to_signed(record.content_entity_id.into_inner(), "content_entity_id")?)
        .bind(to_signed(
            record.content_entity_revision_id,
            "content_entity_revision_id",
        )?)
        .bind(&record.langcode)
        .bind(&record.workflow)
        .bind(&record.moderation_state)
        .bind(to_signed(record.owner_id, "uid")?)
        .fetch_one(&self.pool)
        .await?;

        record.id = Some(RecordId::new(to_unsigned(id, "id")?));

        Ok(())
    }

    async fn update_record(&self, id: RecordId, record: &ModerationStateRecord) -> ModstateResult<()> {
        let result = sqlx::query(
            r#"
            update modstate.content_moderation_state
            set content_entity_revision_id = $2,
                moderation_state = $3,
                uid = $4,
                updated_at = now()
            where id = $1
            "#,
        )
        .bind(to_signed(id.into_inner(), "id")?)
        .bind(to_signed(
            record.content_entity_revision_id,
            "content_entity_revision_id",
        )?)
        .bind(&record.moderation_state)
        .bind(to_signed(record.owner_id, "uid")?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!(
                ErrorKind::InvalidState,
                "Moderation state record to update does not exist",
                format!("record {id}")
            );
        }

        Ok(())
    }
}

impl EntityStore for PostgresStore {
    async fn list_ids(&self, start_id: EntityId, limit: Option<u64>) -> ModstateResult<Vec<EntityId>> {
        let limit = limit.map(|limit| to_signed(limit, "limit")).transpose()?;

        // A null limit is the same as no limit in Postgres.
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            select nid::bigint
            from node
            where nid >= $1
            order by nid asc
            limit $2
            "#,
        )
        .bind(to_signed(start_id.into_inner(), "start_id")?)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = ids.len(), %start_id, "listed node ids");

        ids.into_iter()
            .map(|id| to_unsigned(id, "nid").map(EntityId::new))
            .collect()
    }

    async fn load_entities(
        &self,
        ids: &[EntityId],
    ) -> ModstateResult<BTreeMap<EntityId, ContentEntity>> {
        let ids = ids
            .iter()
            .map(|id| to_signed(id.into_inner(), "nid"))
            .collect::<ModstateResult<Vec<_>>>()?;

        let rows = sqlx::query_as::<_, NodeRow>(
            r#"
            select d.nid::bigint as nid,
                   d.vid::bigint as vid,
                   d.type as bundle,
                   d.langcode,
                   d.uid::bigint as uid,
                   d.status::int = 1 as published
            from node_field_data d
            where d.nid = any($1)
              and d.default_langcode::int = 1
            order by d.nid asc
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| ContentEntity::try_from(row).map(|entity| (entity.id, entity)))
            .collect()
    }
}

impl ModerationStateStore for PostgresStore {
    async fn find_state_record(
        &self,
        key: &RecordKey,
    ) -> ModstateResult<Option<ModerationStateRecord>> {
        let row = sqlx::query_as::<_, ModerationStateRow>(
            r#"
            select id, content_entity_type_id, content_entity_id, content_entity_revision_id,
                   langcode, workflow, moderation_state, uid
            from modstate.content_moderation_state
            where content_entity_type_id = $1
              and content_entity_id = $2
              and content_entity_revision_id = $3
              and langcode = $4
              and workflow = $5
            order by id asc
            limit 1
            "#,
        )
        .bind(&key.entity_type)
        .bind(to_signed(key.entity_id.into_inner(), "content_entity_id")?)
        .bind(to_signed(key.revision_id, "content_entity_revision_id")?)
        .bind(&key.langcode)
        .bind(&key.workflow)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ModerationStateRecord::try_from).transpose()
    }

    async fn save_record(&self, record: &mut ModerationStateRecord) -> ModstateResult<SaveOutcome> {
        match record.id {
            None => {
                self.insert_record(record).await?;
                Ok(SaveOutcome::Created)
            }
            Some(id) => {
                self.update_record(id, record).await?;
                Ok(SaveOutcome::Updated)
            }
        }
    }
}
