//! User commands

use std::sync::Arc;

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::UserService;
use crate::storage::SeaOrmStorage;

fn user_service(storage: Arc<SeaOrmStorage>) -> UserService {
    UserService::new(storage.clone(), storage)
}

pub async fn upsert_user(
    storage: Arc<SeaOrmStorage>,
    id: String,
    name: Option<String>,
) -> Result<(), CliError> {
    let user = user_service(storage)
        .register_contact(&id, name.as_deref(), None)
        .await
        .map_err(|e| CliError::CommandError(e.message()))?;

    println!(
        "{} {} {}",
        "✓".bold().green(),
        user.id.cyan(),
        user.shown_name().unwrap_or("-").dimmed()
    );
    println!(
        "  total clicks: {}",
        user.total_clicks.to_string().green()
    );
    Ok(())
}

pub async fn show_user(storage: Arc<SeaOrmStorage>, id: String) -> Result<(), CliError> {
    let stats = user_service(storage)
        .user_stats(&id)
        .await
        .map_err(|e| CliError::CommandError(e.message()))?;

    let user = &stats.user;
    println!("{} {}", "User".bold().green(), user.id.cyan());
    println!("  username:     {}", user.username.as_deref().unwrap_or("-"));
    println!("  display name: {}", user.display_name.as_deref().unwrap_or("-"));
    println!("  total clicks: {}", user.total_clicks.to_string().green());
    println!("  rank:         #{}", stats.rank.to_string().yellow());
    if let Some(last) = user.last_active_at {
        println!(
            "  last active:  {}",
            last.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        );
    }
    Ok(())
}
