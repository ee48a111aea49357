//! Setup command - Seeds roles, churches and administrator accounts.

use crate::cli::args::SetupArgs;
use crate::config::Config;
use crate::errors::AppResult;
use crate::services::{ServiceContainer, SetupOptions};

/// Execute the setup command
pub async fn execute(args: SetupArgs, config: Config) -> AppResult<()> {
    let (_db, services) = super::connect_services(config).await?;

    let report = services
        .setup()
        .run(SetupOptions {
            admin_password: args.admin_password,
            super_admin_password: args.super_admin_password,
        })
        .await?;

    println!("Roles created:    {}", report.roles_created);
    println!("Churches created: {}", report.churches_created);
    if report.accounts_created.is_empty() {
        println!("Accounts created: none");
    } else {
        println!("Accounts created:");
        for email in &report.accounts_created {
            println!("  {}", email);
        }
    }

    tracing::info!("Setup complete");
    Ok(())
}
