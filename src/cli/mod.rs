//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `setup` - Seed roles, churches and administrator accounts
//! - `update-locations` - Refresh church locations and regions
//! - `transfer` - File import and export

pub mod args;

pub use args::{Cli, Commands};
