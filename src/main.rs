//! # ledge - nested Wayland panel
//!
//! Connects to the host compositor as a layer-shell client, opens an embedded
//! display for plugins and runs both on one event loop.

use clap::Parser;
use log::{error, info};

use ledge::config::DEFAULT_CONFIG_PATH;
use ledge::{FatalError, Panel, PanelConfig};

#[derive(Parser, Debug)]
#[command(name = "ledge")]
#[command(about = "A nested Wayland panel that hosts plugin clients in a layer-shell strip")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Panel height in pixels (overrides the configuration file)
    #[arg(long)]
    height: Option<u32>,

    /// Plugin command line, may be repeated
    #[arg(short, long = "plugin", value_name = "CMD")]
    plugins: Vec<String>,
}

/// Loads the configuration file, falling back to defaults, then applies CLI overrides.
fn resolve_config(cli: &Cli) -> PanelConfig {
    let mut config = match PanelConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            info!("📝 Using default configuration");
            PanelConfig::default()
        }
    };

    if let Some(height) = cli.height {
        config.panel.height = height;
    }
    config.plugins.commands.extend(cli.plugins.iter().cloned());
    config
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!("🚀 Starting ledge");
    info!("📄 Version: {} (built {})", ledge::VERSION, ledge::BUILD_DATE);

    let config = resolve_config(&cli);
    let result = config
        .validate()
        .map_err(|e| anyhow::Error::from(FatalError::Config(format!("{:#}", e))))
        .and_then(|_| Panel::run(&config));
    if let Err(e) = result {
        error!("❌ Fatal: {:#}", e);
        std::process::exit(1);
    }
}
