//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::ServiceConfig;
use crate::store::WorldStore;

/// Handle passed to every handler. Cloning is one atomic increment.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn WorldStore>,
    limiter: Option<Arc<Semaphore>>,
    strict_not_found: bool,
}

impl AppState {
    /// State with unbounded fetch fan-out and permissive not-found handling.
    pub fn new(store: Arc<dyn WorldStore>) -> Self {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn WorldStore>) -> AppStateBuilder {
        AppStateBuilder { store, db_concurrency: None, strict_not_found: false }
    }

    /// State configured from the service section of [`Config`](crate::Config).
    pub fn from_config(store: Arc<dyn WorldStore>, config: &ServiceConfig) -> Self {
        let mut builder = Self::builder(store).strict_not_found(config.strict_not_found);
        if let Some(limit) = config.db_concurrency {
            builder = builder.db_concurrency(limit);
        }
        builder.build()
    }

    pub fn store(&self) -> &Arc<dyn WorldStore> {
        &self.inner.store
    }

    /// Process-wide permit pool for fan-out fetches, if one is configured.
    pub fn limiter(&self) -> Option<&Arc<Semaphore>> {
        self.inner.limiter.as_ref()
    }

    pub fn strict_not_found(&self) -> bool {
        self.inner.strict_not_found
    }
}

pub struct AppStateBuilder {
    store: Arc<dyn WorldStore>,
    db_concurrency: Option<usize>,
    strict_not_found: bool,
}

impl AppStateBuilder {
    /// Caps concurrent `/dbs` fetches across every request in the process.
    pub fn db_concurrency(mut self, limit: usize) -> Self {
        self.db_concurrency = Some(limit.max(1));
        self
    }

    pub fn strict_not_found(mut self, strict: bool) -> Self {
        self.strict_not_found = strict;
        self
    }

    pub fn build(self) -> AppState {
        AppState {
            inner: Arc::new(Inner {
                store: self.store,
                limiter: self.db_concurrency.map(|n| Arc::new(Semaphore::new(n))),
                strict_not_found: self.strict_not_found,
            }),
        }
    }
}
