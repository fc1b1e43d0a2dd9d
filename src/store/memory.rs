//! In-process store.
//!
//! Holds the `World` table in a `HashMap` behind a mutex. Good enough to
//! drive every endpoint without Postgres; `set_available(false)` makes every
//! call fail the way an unreachable database would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{StoreError, WorldStore};
use crate::world::{Fortune, MAX_ID, MIN_ID, World};

#[derive(Debug)]
pub struct MemoryStore {
    worlds: Mutex<HashMap<i32, i32>>,
    fortunes: Vec<Fortune>,
    available: AtomicBool,
}

impl MemoryStore {
    /// An empty table. Every fetch misses.
    pub fn new() -> Self {
        Self::from_worlds(std::iter::empty())
    }

    /// The standard fixture: ids `1..=10000`, each with `random_number`.
    pub fn seeded(random_number: i32) -> Self {
        Self::from_worlds((MIN_ID..=MAX_ID).map(|id| World::new(id, random_number)))
    }

    pub fn from_worlds(worlds: impl IntoIterator<Item = World>) -> Self {
        Self {
            worlds: Mutex::new(worlds.into_iter().map(|w| (w.id, w.random_number)).collect()),
            fortunes: Vec::new(),
            available: AtomicBool::new(true),
        }
    }

    pub fn with_fortunes(mut self, fortunes: Vec<Fortune>) -> Self {
        self.fortunes = fortunes;
        self
    }

    /// Simulates the database going away (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current stored value for `id`, bypassing availability.
    pub fn get(&self, id: i32) -> Option<World> {
        self.lock()
            .ok()?
            .get(&id)
            .map(|&random_number| World::new(id, random_number))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<i32, i32>>, StoreError> {
        self.worlds
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_owned()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl WorldStore for MemoryStore {
    async fn fetch(&self, id: i32) -> Result<World, StoreError> {
        self.check_available()?;
        self.lock()?
            .get(&id)
            .map(|&random_number| World::new(id, random_number))
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, world: World) -> Result<World, StoreError> {
        self.check_available()
            .map_err(|e| StoreError::WriteFailure(e.to_string()))?;
        match self.lock()?.get_mut(&world.id) {
            Some(slot) => {
                *slot = world.random_number;
                Ok(world)
            }
            None => Err(StoreError::WriteFailure(format!("no world row with id {}", world.id))),
        }
    }

    async fn read_modify_write(&self, id: i32, random_number: i32) -> Result<World, StoreError> {
        self.check_available()
            .map_err(|e| StoreError::WriteFailure(e.to_string()))?;
        let mut worlds = self.lock()?;
        let slot = worlds.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        *slot = random_number;
        Ok(World::new(id, random_number))
    }

    async fn fortunes(&self) -> Result<Vec<Fortune>, StoreError> {
        self.check_available()?;
        Ok(self.fortunes.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_store_covers_every_id() {
        let store = MemoryStore::seeded(0);
        assert_eq!(store.fetch(MIN_ID).await, Ok(World::new(MIN_ID, 0)));
        assert_eq!(store.fetch(MAX_ID).await, Ok(World::new(MAX_ID, 0)));
        assert_eq!(store.fetch(MAX_ID + 1).await, Err(StoreError::NotFound { id: MAX_ID + 1 }));
    }

    #[tokio::test]
    async fn read_modify_write_persists() {
        let store = MemoryStore::seeded(0);
        let world = store.read_modify_write(9, 123).await.unwrap();
        assert_eq!(world, World::new(9, 123));
        assert_eq!(store.get(9), Some(world));
    }

    #[tokio::test]
    async fn unavailable_store_fails_writes_as_write_failures() {
        let store = MemoryStore::seeded(0);
        store.set_available(false);
        assert!(matches!(store.fetch(1).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.read_modify_write(1, 5).await, Err(StoreError::WriteFailure(_))));
        assert_eq!(store.get(1), Some(World::new(1, 0)));

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_a_write_failure() {
        let store = MemoryStore::new();
        assert!(matches!(store.update(World::new(3, 3)).await, Err(StoreError::WriteFailure(_))));
    }
}
