//! Postgres-backed store.
//!
//! Uses an sqlx `PgPool`. Every call checks a connection out of the pool
//! (implicitly via `&PgPool` or explicitly via `begin`) and returns it when
//! the call finishes, so concurrent callers never share a connection.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing::debug;

use super::{StoreError, WorldStore};
use crate::config::DatabaseConfig;
use crate::world::{Fortune, World};

const SELECT_WORLD: &str = r#"SELECT id, randomnumber FROM "World" WHERE id = $1"#;
const SELECT_WORLD_FOR_UPDATE: &str =
    r#"SELECT id, randomnumber FROM "World" WHERE id = $1 FOR UPDATE"#;
const UPDATE_WORLD: &str = r#"UPDATE "World" SET randomnumber = $1 WHERE id = $2"#;
const SELECT_FORTUNES: &str = r#"SELECT id, message FROM "Fortune""#;

/// [`WorldStore`] over a Postgres connection pool.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the pool described by `config`.
    ///
    /// Connections are opened lazily on first checkout: the service starts
    /// and answers `/json` and `/plaintext` even while the database is down.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .ssl_mode(config.ssl_mode);

        debug!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "configuring postgres pool",
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        Self { pool }
    }

    /// Closes the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl WorldStore for PgStore {
    async fn fetch(&self, id: i32) -> Result<World, StoreError> {
        sqlx::query_as::<_, World>(SELECT_WORLD)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, world: World) -> Result<World, StoreError> {
        let done = sqlx::query(UPDATE_WORLD)
            .bind(world.random_number)
            .bind(world.id)
            .execute(&self.pool)
            .await
            .map_err(write_failure)?;

        if done.rows_affected() == 0 {
            return Err(StoreError::WriteFailure(format!("no world row with id {}", world.id)));
        }
        Ok(world)
    }

    async fn read_modify_write(&self, id: i32, random_number: i32) -> Result<World, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_failure)?;

        let mut world = sqlx::query_as::<_, World>(SELECT_WORLD_FOR_UPDATE)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(write_failure)?
            .ok_or(StoreError::NotFound { id })?;

        world.random_number = random_number;

        sqlx::query(UPDATE_WORLD)
            .bind(world.random_number)
            .bind(world.id)
            .execute(&mut *tx)
            .await
            .map_err(write_failure)?;

        // Dropping `tx` without commit rolls back, so every early return
        // above leaves the row untouched.
        tx.commit().await.map_err(write_failure)?;
        Ok(world)
    }

    async fn fortunes(&self) -> Result<Vec<Fortune>, StoreError> {
        sqlx::query_as::<_, Fortune>(SELECT_FORTUNES)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(unavailable)
    }
}

/// Pool and transport failures mean the store is out of reach.
fn is_connectivity(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
    )
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn write_failure(e: sqlx::Error) -> StoreError {
    if is_connectivity(&e) {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::WriteFailure(e.to_string())
    }
}
