//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::Database;
use crate::services::{ServiceContainer, Services};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Used by the health check
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire every service on top of `database`.
    pub fn from_config(database: Arc<Database>, config: Config) -> Self {
        let services = Arc::new(Services::from_connection(database.get_connection(), config));
        Self { services, database }
    }

    /// Build state around an existing container, e.g. one with stubbed services.
    pub fn new(services: Arc<dyn ServiceContainer>, database: Arc<Database>) -> Self {
        Self { services, database }
    }
}
