use modstate::store::both::postgres::MODSTATE_SCHEMA;
use modstate_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::{
    Executor,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

/// Number of database connections to use for the migration pool.
const NUM_POOL_CONNECTIONS: u32 = 1;

/// Creates the `modstate` schema and applies the pending migrations of the moderation state table.
///
/// The migrations run with `modstate` as search path so that the metadata table created by `sqlx`
/// does not land in the schema of the host CMS.
pub async fn migrate_moderation_store(
    connection_config: &PgConnectionConfig,
) -> Result<(), sqlx::Error> {
    let options: PgConnectOptions = connection_config.with_db();

    let pool = PgPoolOptions::new()
        .max_connections(NUM_POOL_CONNECTIONS)
        .min_connections(NUM_POOL_CONNECTIONS)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute(&*format!("create schema if not exists {MODSTATE_SCHEMA};"))
                    .await?;
                conn.execute(&*format!("set search_path = '{MODSTATE_SCHEMA}';"))
                    .await?;

                Ok(())
            })
        })
        .connect_with(options)
        .await?;

    info!("applying migrations to the moderation state store");

    let migrator = sqlx::migrate!("./migrations");
    migrator.run(&pool).await?;
    pool.close().await;

    info!("migrations successfully applied to the moderation state store");

    Ok(())
}
