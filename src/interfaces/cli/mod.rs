//! CLI interface module
//!
//! 一次性的维护命令，直接连接数据库，不经过缓存。

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands, UserCommands};
use crate::config::get_config;
use crate::storage::StorageFactory;
use commands::{config_generate, print_leaderboard, show_user, upsert_user};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::ClickerError> for CliError {
    fn from(err: crate::errors::ClickerError) -> Self {
        CliError::StorageError(err.to_string())
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // config generate 不需要数据库
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    let config = get_config();
    let storage = StorageFactory::create(&config.database)
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    let result = match cmd {
        Commands::User {
            action: UserCommands::Add { id, name },
        } => upsert_user(storage.clone(), id, name).await,
        Commands::User {
            action: UserCommands::Show { id },
        } => show_user(storage.clone(), id).await,
        Commands::Leaderboard { limit } => {
            print_leaderboard(storage.clone(), limit.clamp(1, config.leaderboard.max_limit.max(1)))
                .await
        }
        Commands::Serve | Commands::Config { .. } => Err(CliError::CommandError(
            "command is not handled by the CLI runner".to_string(),
        )),
    };

    if let Err(e) = storage.as_ref().clone().close().await {
        tracing::warn!("Failed to close database: {}", e);
    }
    result
}
