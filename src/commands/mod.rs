//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module for separation of concerns.

pub mod locations;
pub mod migrate;
pub mod serve;
pub mod setup;
pub mod transfer;

use std::sync::Arc;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::services::Services;

/// Connect, apply pending migrations and wire the services for a one-shot command.
pub(crate) async fn connect_services(config: Config) -> AppResult<(Arc<Database>, Services)> {
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let services = Services::from_connection(db.get_connection(), config);
    Ok((Arc::new(db), services))
}
