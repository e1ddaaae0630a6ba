use modstate_config::shared::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use tokio::runtime::Handle;
use uuid::Uuid;

use crate::store::both::postgres::MODSTATE_SCHEMA;
use crate::types::ContentEntity;

/// Returns the [`PgConnectionConfig`] to connect to the local instance of Postgres.
///
/// Every call picks a random database name so that tests never share a database.
fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: "localhost".to_owned(),
        port: 5430,
        name: Uuid::new_v4().to_string(),
        username: "postgres".to_owned(),
        password: Some(Secret::new("postgres".to_owned())),
        tls: TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        },
    }
}

/// A throwaway database holding the host content tables and the moderation state table.
///
/// The database is dropped together with this value, which requires a multi threaded runtime.
pub struct TestDatabase {
    pub config: PgConnectionConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Inserts `entity` as a node with its default translation.
    ///
    /// # Panics
    ///
    /// Panics if the rows cannot be inserted.
    pub async fn insert_node(&self, entity: &ContentEntity) {
        let nid = i64::try_from(entity.id.into_inner()).expect("nid does not fit in bigint");
        let vid = i64::try_from(entity.revision_id).expect("vid does not fit in bigint");
        let uid = i64::try_from(entity.owner_id).expect("uid does not fit in bigint");

        sqlx::query("insert into node (nid, vid, type, langcode) values ($1, $2, $3, $4)")
            .bind(nid)
            .bind(vid)
            .bind(&entity.bundle)
            .bind(&entity.langcode)
            .execute(&self.pool)
            .await
            .expect("Failed to insert node");

        sqlx::query(
            r#"
            insert into node_field_data (nid, vid, type, langcode, status, uid, title, default_langcode)
            values ($1, $2, $3, $4, $5, $6, $7, 1)
            "#,
        )
        .bind(nid)
        .bind(vid)
        .bind(&entity.bundle)
        .bind(&entity.langcode)
        .bind(i16::from(entity.published))
        .bind(uid)
        .bind(format!("Node {nid}"))
        .execute(&self.pool)
        .await
        .expect("Failed to insert node field data");
    }

    /// Adds a non-default translation of the node `nid`.
    ///
    /// # Panics
    ///
    /// Panics if the row cannot be inserted.
    pub async fn insert_translation(&self, entity: &ContentEntity, langcode: &str) {
        let nid = i64::try_from(entity.id.into_inner()).expect("nid does not fit in bigint");
        let vid = i64::try_from(entity.revision_id).expect("vid does not fit in bigint");
        let uid = i64::try_from(entity.owner_id).expect("uid does not fit in bigint");

        sqlx::query(
            r#"
            insert into node_field_data (nid, vid, type, langcode, status, uid, title, default_langcode)
            values ($1, $2, $3, $4, $5, $6, $7, 0)
            "#,
        )
        .bind(nid)
        .bind(vid)
        .bind(&entity.bundle)
        .bind(langcode)
        .bind(i16::from(entity.published))
        .bind(uid)
        .bind(format!("Node {nid} ({langcode})"))
        .execute(&self.pool)
        .await
        .expect("Failed to insert node translation");
    }

    /// Returns the number of rows in the moderation state table.
    pub async fn count_state_records(&self) -> i64 {
        sqlx::query_scalar("select count(*) from modstate.content_moderation_state")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count moderation state records")
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        // `block_in_place` needs a multi threaded runtime to offload the other tasks.
        tokio::task::block_in_place(move || {
            Handle::current().block_on(async move { drop_pg_database(&self.config).await });
        });
    }
}

/// Creates a database with a random name, the host content tables and the moderation state
/// table created by the rebuild migrations.
///
/// # Panics
///
/// Panics if any of the setup statements fails.
pub async fn spawn_database() -> TestDatabase {
    let config = local_pg_connection_config();

    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"create database "{}";"#, config.name))
        .await
        .expect("Failed to create database");

    // A dedicated single connection pool keeps the migrations metadata inside the modstate schema.
    let migration_pool = PgPoolOptions::new()
        .max_connections(1)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute(&*format!("create schema if not exists {MODSTATE_SCHEMA};"))
                    .await?;
                conn.execute(&*format!("set search_path = '{MODSTATE_SCHEMA}';"))
                    .await?;

                Ok(())
            })
        })
        .connect_with(config.with_db())
        .await
        .expect("Failed to connect with sqlx");

    sqlx::migrate!("../rebuild/migrations")
        .run(&migration_pool)
        .await
        .expect("Failed to run rebuild migrations");
    migration_pool.close().await;

    let pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres");

    create_content_tables(&pool).await;

    TestDatabase { config, pool }
}

/// Creates the subset of the host CMS node tables read by the Postgres store.
async fn create_content_tables(pool: &PgPool) {
    pool.execute(
        r#"
        create table public.node (
            nid serial primary key,
            vid integer not null,
            type varchar(32) not null,
            langcode varchar(12) not null
        );

        create table public.node_field_data (
            nid integer not null references public.node (nid),
            vid integer not null,
            type varchar(32) not null,
            langcode varchar(12) not null,
            status smallint not null,
            uid integer not null,
            title varchar(255) not null,
            default_langcode smallint not null,
            primary key (nid, langcode)
        );
        "#,
    )
    .await
    .expect("Failed to create content tables");
}

/// Terminates the connections to the test database and drops it.
async fn drop_pg_database(config: &PgConnectionConfig) {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(&*format!(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = '{}'
            and pid <> pg_backend_pid();"#,
            config.name
        ))
        .await
        .expect("Failed to terminate database connections");

    connection
        .execute(&*format!(r#"drop database if exists "{}";"#, config.name))
        .await
        .expect("Failed to destroy database");
}
