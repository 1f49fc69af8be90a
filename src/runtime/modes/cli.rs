//! CLI mode
//!
//! Delegates to the command implementations in `interfaces::cli`.

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    crate::runtime::lifetime::startup::install_crypto_provider();
    crate::interfaces::cli::run_cli_command(cmd).await
}
