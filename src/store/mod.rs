//! Row repository.
//!
//! Handlers never talk to a database directly. They hold an
//! `Arc<dyn WorldStore>` and call the operations below, each of which borrows
//! its own connection for exactly as long as it runs. Two implementations
//! ship with the crate:
//!
//! | Store | Backing | Used by |
//! |---|---|---|
//! | [`PgStore`] | sqlx `PgPool` | the `worldbench` binary |
//! | [`MemoryStore`] | in-process table | tests, local runs without Postgres |

use async_trait::async_trait;
use thiserror::Error;

use crate::world::{Fortune, World};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Failure reported by a [`WorldStore`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    /// No row with this id. Should not happen against a seeded table.
    #[error("world {id} not found")]
    NotFound { id: i32 },

    /// The store rejected a write (lost connection, constraint, no row hit).
    #[error("write failed: {0}")]
    WriteFailure(String),

    /// Could not reach the store at all (pool timeout, pool closed, I/O).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Access to the `World` and `Fortune` tables.
#[async_trait]
pub trait WorldStore: Send + Sync + 'static {
    /// Returns the row with `id`, or [`StoreError::NotFound`].
    async fn fetch(&self, id: i32) -> Result<World, StoreError>;

    /// Overwrites `randomNumber` of the row identified by `world.id`.
    ///
    /// Returns the row as persisted. Any store error, including an update
    /// that matched no row, is a [`StoreError::WriteFailure`].
    async fn update(&self, world: World) -> Result<World, StoreError>;

    /// Reads row `id`, replaces its `randomNumber` with `random_number` and
    /// persists it.
    ///
    /// The default runs [`fetch`](Self::fetch) then [`update`](Self::update);
    /// stores with transactions override it to make the pair atomic.
    async fn read_modify_write(&self, id: i32, random_number: i32) -> Result<World, StoreError> {
        let mut world = self.fetch(id).await?;
        world.random_number = random_number;
        self.update(world).await
    }

    /// Every row of the `Fortune` table, in store order.
    async fn fortunes(&self) -> Result<Vec<Fortune>, StoreError>;

    /// One trivial round-trip, for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
