use clap::Parser;

use clicker::cli::Cli;
use clicker::config::{get_config, init_config};
use clicker::system::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config(cli.config.as_deref());
    let config = get_config();

    if cli.is_server_mode() {
        let _guard = init_logging(&config.logging)?;
        clicker::runtime::modes::run_server().await?;
        return Ok(());
    }

    #[cfg(feature = "cli")]
    if let Some(cmd) = cli.command {
        // CLI 模式只输出警告以上的日志，避免干扰命令输出
        let mut logging = config.logging.clone();
        logging.level = "warn".to_string();
        logging.file = None;
        let _guard = init_logging(&logging)?;

        if let Err(e) = clicker::runtime::modes::run_cli(cmd).await {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    }

    Ok(())
}
