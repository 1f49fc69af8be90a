//! Leaderboard command

use std::sync::Arc;

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::storage::{SeaOrmStorage, UserStore};

pub async fn print_leaderboard(storage: Arc<SeaOrmStorage>, limit: usize) -> Result<(), CliError> {
    let (users, total) = tokio::try_join!(storage.top_users(limit), storage.sum_totals())
        .map_err(|e| CliError::CommandError(format!("Failed to load leaderboard: {}", e)))?;

    if users.is_empty() {
        println!("{} No players yet", "ℹ".bold().blue());
        return Ok(());
    }

    println!("{}", "Leaderboard:".bold().green());
    println!();
    for (i, user) in users.iter().enumerate() {
        println!(
            "  {:>4}  {:<24} {}",
            format!("#{}", i + 1).yellow(),
            user.shown_name().unwrap_or(&user.id).cyan(),
            user.total_clicks.to_string().green()
        );
    }
    println!();
    println!(
        "{} Global total: {}",
        "ℹ".bold().blue(),
        total.to_string().green()
    );
    Ok(())
}
