//! church-admin - Multi-tenant church membership administration
//!
//! Each church is a tenant identified by its email subdomain
//! (`kasiglahan` in `juan@kasiglahan.jcsgo.com`). Users belong to exactly
//! one church and hold one role on a fixed ladder; every read and write is
//! checked against that role and church by a single access control
//! resolver.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Churches, roles, users, member profiles, groups, activity and access rules
//! - **services**: Use cases (auth, members, groups, reports, import/export, setup)
//! - **infra**: Database, migrations, repositories and the Unit of Work
//! - **api**: HTTP handlers, extractors, middleware and routes
//! - **types**: Shared types (pagination, responses)
//! - **utils**: CSV/XLSX/JSON codecs
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Create roles, churches and administrator accounts
//! church-admin setup --admin-password '...' --super-admin-password '...'
//!
//! # Start the server
//! church-admin serve
//!
//! # Export every user of one church as a spreadsheet
//! church-admin transfer export user --church tabak --format xlsx
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, Principal, RoleCode, User};
pub use errors::{AppError, AppResult};
