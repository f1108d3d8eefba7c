pub mod config;
pub mod error;
pub mod habits;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::HabitdConfig;
use habits::service::{HabitLogService, HabitService};
use habits::storage::{HabitLogStore, HabitStore};
use storage::Storage;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<HabitdConfig>,
    pub storage: Arc<Storage>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<HabitdConfig>, storage: Arc<Storage>) -> Self {
        Self {
            config,
            storage,
            started_at: std::time::Instant::now(),
        }
    }

    /// Build a habit service over the shared pool (cheap — pool clones).
    pub fn habit_service(&self) -> HabitService {
        let pool = self.storage.pool();
        HabitService::new(HabitStore::new(pool.clone()), HabitLogStore::new(pool))
    }

    /// Build a log service over the shared pool.
    pub fn log_service(&self) -> HabitLogService {
        let pool = self.storage.pool();
        HabitLogService::new(HabitStore::new(pool.clone()), HabitLogStore::new(pool))
    }
}
