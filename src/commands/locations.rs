//! Update-locations command - Re-applies canonical church locations.

use crate::config::Config;
use crate::errors::AppResult;
use crate::services::ServiceContainer;

/// Execute the update-locations command
pub async fn execute(config: Config) -> AppResult<()> {
    let (_db, services) = super::connect_services(config).await?;

    let updated = services.setup().update_locations().await?;
    println!("Updated {} church location(s)", updated);
    Ok(())
}
