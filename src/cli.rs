//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// clicker - click accounting and leaderboard backend
#[derive(Parser)]
#[command(name = "clicker")]
#[command(version)]
#[command(about = "Click accounting, rate limiting and leaderboard backend", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default when no command is given)
    Serve,

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Print the current leaderboard straight from the database
    Leaderboard {
        /// Number of entries to show
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum UserCommands {
    /// Create a user, or refresh an existing one
    Add {
        /// Telegram user id
        id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show a user's total and rank
    Show {
        id: String,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// 没有子命令时按 serve 处理
    pub fn is_server_mode(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_server_mode() {
        let cli = Cli::try_parse_from(["clicker"]).unwrap();
        assert!(cli.is_server_mode());
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["clicker", "serve", "-c", "prod.toml"]).unwrap();
        assert!(cli.is_server_mode());
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
    }

    #[test]
    fn test_parses_user_add() {
        let cli = Cli::try_parse_from(["clicker", "user", "add", "42", "--name", "Ann"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::User {
                action: UserCommands::Add {
                    id: "42".to_string(),
                    name: Some("Ann".to_string()),
                }
            })
        );
        assert!(!cli.is_server_mode());
    }

    #[test]
    fn test_leaderboard_limit_default() {
        let cli = Cli::try_parse_from(["clicker", "leaderboard"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Leaderboard { limit: 20 }));
    }
}
