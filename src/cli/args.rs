//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::Format;

/// JCSGO church administration - membership, groups and reporting across churches
#[derive(Parser, Debug)]
#[command(name = "church-admin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),

    /// Create the roles, churches and administrator accounts (safe to re-run)
    Setup(SetupArgs),

    /// Re-apply the canonical location and region of every church
    UpdateLocations,

    /// Import or export data files
    Transfer(TransferArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "SERVER_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "SERVER_PORT")]
    pub port: u16,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the setup command
#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Password for every church's admin@ account.
    /// Accounts are created locked when omitted.
    #[arg(long, env = "SETUP_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Password for the superadmin account
    #[arg(long, env = "SETUP_SUPER_ADMIN_PASSWORD", hide_env_values = true)]
    pub super_admin_password: Option<String>,
}

/// Arguments for the transfer command
#[derive(Parser, Debug)]
pub struct TransferArgs {
    #[command(subcommand)]
    pub action: TransferAction,
}

/// Transfer directions
#[derive(Subcommand, Debug)]
pub enum TransferAction {
    /// Write a data set to a file
    Export {
        /// church, role, user, newfriend, regularmember, group, activitylog or all
        model: String,

        /// Output file, or directory for `all` (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File format
        #[arg(short, long, default_value = "csv")]
        format: Format,

        /// Restrict the export to one church domain
        #[arg(long)]
        church: Option<String>,
    },
    /// Load a file of churches, users or groups
    Import {
        /// church, user, group or all
        model: String,

        /// Input file, or directory for `all`
        #[arg(short, long)]
        input: PathBuf,

        /// File format; guessed from the file extension when omitted
        #[arg(short, long)]
        format: Option<Format>,

        /// Validate every row without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_transfer_export() {
        let cli = Cli::try_parse_from([
            "church-admin",
            "transfer",
            "export",
            "user",
            "--format",
            "xlsx",
            "--church",
            "tabak",
        ])
        .unwrap();
        match cli.command {
            Commands::Transfer(TransferArgs {
                action: TransferAction::Export { model, format, church, .. },
            }) => {
                assert_eq!(model, "user");
                assert_eq!(format, Format::Xlsx);
                assert_eq!(church.as_deref(), Some("tabak"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parses_update_locations() {
        let cli = Cli::try_parse_from(["church-admin", "update-locations"]).unwrap();
        assert!(matches!(cli.command, Commands::UpdateLocations));
    }
}
