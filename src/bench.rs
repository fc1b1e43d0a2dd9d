//! Request operations: single fetch, concurrent fetch, read-modify-write.
//!
//! # Fan-out on the fetch path
//!
//! [`fetch_many`] spawns one tokio task per requested row and joins them all
//! before answering. Results come back in completion order, not launch
//! order. Nothing here throttles the fan-out: a 500-row request puts 500
//! checkouts in front of the pool, and the pool's blocking checkout is the
//! only backpressure, unless the state carries a limiter
//! ([`AppStateBuilder::db_concurrency`](crate::state::AppStateBuilder::db_concurrency)),
//! in which case every task first takes a permit from one process-wide
//! semaphore.
//!
//! # Updates stay sequential
//!
//! [`update_many`] runs its read-modify-writes one after another on the
//! caller's task and stops at the first failure. No two writes from the same
//! request are ever in flight together.

use rand::Rng;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::queries::QueryCount;
use crate::state::AppState;
use crate::store::StoreError;
use crate::world::{MAX_ID, MIN_ID, World};

/// Uniform pick over the seeded id range.
pub fn random_id() -> i32 {
    rand::thread_rng().gen_range(MIN_ID..=MAX_ID)
}

/// Fetches one random row.
///
/// A failed read yields `World::default()` (id 0) unless the state is in
/// strict mode, where the store error is returned instead.
pub async fn fetch_random(state: &AppState) -> Result<World, StoreError> {
    let id = random_id();
    match state.store().fetch(id).await {
        Ok(world) => Ok(world),
        Err(e) if state.strict_not_found() => Err(e),
        Err(e) => {
            warn!(id, error = %e, "fetch failed, answering with zero-valued row");
            Ok(World::default())
        }
    }
}

/// Fetches `count` random rows concurrently, one task each.
///
/// Always yields exactly `count` rows in permissive mode. In strict mode the
/// first failed fetch is returned and the remaining tasks are aborted.
pub async fn fetch_many(state: &AppState, count: QueryCount) -> Result<Vec<World>, StoreError> {
    let n = count.get();
    let mut tasks = JoinSet::new();

    for _ in 0..n {
        let state = state.clone();
        tasks.spawn(async move {
            let _permit = match state.limiter() {
                Some(limiter) => match limiter.clone().acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => return Err(StoreError::Unavailable(e.to_string())),
                },
                None => None,
            };
            fetch_random(&state).await
        });
    }

    let mut worlds = Vec::with_capacity(n);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(world)) => worlds.push(world),
            // Dropping `tasks` on return aborts whatever is still running.
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                error!(error = %e, "fetch task failed to complete");
                worlds.push(World::default());
            }
        }
    }

    debug!(rows = worlds.len(), "fetch fan-out joined");
    Ok(worlds)
}

/// Picks a random row, gives it a new random number, and persists it.
pub async fn update_random(state: &AppState) -> Result<World, StoreError> {
    let id = random_id();
    let random_number = random_id();
    state.store().read_modify_write(id, random_number).await
}

/// Runs `count` read-modify-writes one at a time, in order.
///
/// Returns the updated rows in issuance order, or the first error. Writes
/// after a failure are never attempted.
pub async fn update_many(state: &AppState, count: QueryCount) -> Result<Vec<World>, StoreError> {
    let n = count.get();
    let mut worlds = Vec::with_capacity(n);

    for i in 0..n {
        match update_random(state).await {
            Ok(world) => worlds.push(world),
            Err(e) => {
                error!(attempt = i + 1, of = n, error = %e, "update batch aborted");
                return Err(e);
            }
        }
    }

    Ok(worlds)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::store::{MemoryStore, WorldStore};
    use crate::world::Fortune;

    fn count(n: usize) -> QueryCount {
        QueryCount::from_param(Some(&n.to_string()))
    }

    fn seeded() -> (Arc<MemoryStore>, AppState) {
        let store = Arc::new(MemoryStore::seeded(0));
        let state = AppState::new(store.clone());
        (store, state)
    }

    /// Delegates to a seeded table but fails the `fail_on`-th write.
    struct FlakyStore {
        inner: MemoryStore,
        writes: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl WorldStore for FlakyStore {
        async fn fetch(&self, id: i32) -> Result<World, StoreError> {
            self.inner.fetch(id).await
        }

        async fn update(&self, world: World) -> Result<World, StoreError> {
            self.inner.update(world).await
        }

        async fn read_modify_write(&self, id: i32, n: i32) -> Result<World, StoreError> {
            let attempt = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt == self.fail_on {
                return Err(StoreError::WriteFailure("deadlock detected".to_owned()));
            }
            self.inner.read_modify_write(id, n).await
        }

        async fn fortunes(&self) -> Result<Vec<Fortune>, StoreError> {
            self.inner.fortunes().await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    /// Seeded table whose reads take a while and record how many overlap.
    struct SlowStore {
        inner: MemoryStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::seeded(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WorldStore for SlowStore {
        async fn fetch(&self, id: i32) -> Result<World, StoreError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.fetch(id).await
        }

        async fn update(&self, world: World) -> Result<World, StoreError> {
            self.inner.update(world).await
        }

        async fn fortunes(&self) -> Result<Vec<Fortune>, StoreError> {
            self.inner.fortunes().await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    #[test]
    fn random_ids_stay_in_seed_range() {
        for _ in 0..10_000 {
            let id = random_id();
            assert!((MIN_ID..=MAX_ID).contains(&id));
        }
    }

    #[tokio::test]
    async fn fetch_random_reads_a_seeded_row() {
        let (_, state) = seeded();
        let world = fetch_random(&state).await.unwrap();
        assert!((MIN_ID..=MAX_ID).contains(&world.id));
        assert_eq!(world.random_number, 0);
    }

    #[tokio::test]
    async fn fetch_random_swallows_missing_rows_by_default() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        assert_eq!(fetch_random(&state).await, Ok(World::default()));
    }

    #[tokio::test]
    async fn fetch_random_surfaces_missing_rows_in_strict_mode() {
        let state = AppState::builder(Arc::new(MemoryStore::new()))
            .strict_not_found(true)
            .build();
        assert!(matches!(fetch_random(&state).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn fetch_many_returns_exactly_count_rows() {
        let (_, state) = seeded();
        for n in [1, 2, 17, 500] {
            let worlds = fetch_many(&state, count(n)).await.unwrap();
            assert_eq!(worlds.len(), n);
            assert!(worlds.iter().all(|w| (MIN_ID..=MAX_ID).contains(&w.id)));
        }
    }

    #[tokio::test]
    async fn fetch_many_keeps_count_when_reads_fail() {
        let store = Arc::new(MemoryStore::seeded(0));
        store.set_available(false);
        let state = AppState::new(store);
        let worlds = fetch_many(&state, count(25)).await.unwrap();
        assert_eq!(worlds, vec![World::default(); 25]);
    }

    #[tokio::test]
    async fn fetch_many_under_a_limiter_still_completes() {
        let store = Arc::new(MemoryStore::seeded(0));
        let state = AppState::builder(store).db_concurrency(2).build();
        let worlds = fetch_many(&state, count(100)).await.unwrap();
        assert_eq!(worlds.len(), 100);
        assert_eq!(state.limiter().unwrap().available_permits(), 2);
    }

    #[tokio::test]
    async fn fetch_many_overlaps_reads() {
        let store = Arc::new(SlowStore::new());
        let state = AppState::new(store.clone());

        let worlds = fetch_many(&state, count(100)).await.unwrap();
        assert_eq!(worlds.len(), 100);
        assert!(store.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn fetch_many_respects_the_limiter() {
        let store = Arc::new(SlowStore::new());
        let state = AppState::builder(store.clone()).db_concurrency(4).build();

        let worlds = fetch_many(&state, count(100)).await.unwrap();
        assert_eq!(worlds.len(), 100);
        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 4, "peak {peak}");
    }

    #[tokio::test]
    async fn update_many_persists_every_row_in_order() {
        let (store, state) = seeded();
        let worlds = update_many(&state, count(5)).await.unwrap();
        assert_eq!(worlds.len(), 5);
        for world in &worlds {
            assert!((MIN_ID..=MAX_ID).contains(&world.random_number));
        }
        // Duplicate ids are possible; the last write for an id must win.
        let mut last = std::collections::HashMap::new();
        for world in &worlds {
            last.insert(world.id, world.random_number);
        }
        for (id, n) in last {
            assert_eq!(store.get(id), Some(World::new(id, n)));
        }
    }

    #[tokio::test]
    async fn update_many_stops_at_first_failure() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::seeded(0),
            writes: AtomicUsize::new(0),
            fail_on: 3,
        });
        let state = AppState::new(store.clone());

        let err = update_many(&state, count(10)).await.unwrap_err();
        assert_eq!(err, StoreError::WriteFailure("deadlock detected".to_owned()));
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
    }
}
