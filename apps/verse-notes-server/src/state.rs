//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::lookup::DefinitionLookup;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    lookup: Arc<dyn DefinitionLookup>,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool, lookup: Arc<dyn DefinitionLookup>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, db, lookup }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the definition lookup
    pub fn lookup(&self) -> &dyn DefinitionLookup {
        self.inner.lookup.as_ref()
    }
}
