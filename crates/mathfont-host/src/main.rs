use std::path::PathBuf;

use clap::Parser;
use eyre::Result;

use mathfont_host::commands::{self, Command};
use mathfont_host::config::{self, HostConfig};
use mathfont_host::state::HostState;

/// Inspect and change the math font override settings.
#[derive(Debug, Parser)]
#[command(name = "mathfont", version)]
struct Cli {
    /// Config file (default: <config dir>/mathfont/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Local storage file, overriding the config
    #[arg(long, global = true)]
    storage: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut config = config::load_config(&config_path)?;
    if cli.storage.is_some() {
        config.storage_path = cli.storage;
    }
    init_tracing(&config);

    let state = HostState::open(config, config_path)?;
    let output = commands::execute(&cli.command, &state).await?;
    println!("{output}");
    Ok(())
}

fn init_tracing(config: &HostConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
