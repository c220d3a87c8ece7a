use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::{
    config::Config,
    settings::{delay_from_secs, Settings, StoredSettings},
    store::FileSettingsStore,
};

const DEFAULT_STORE_PATH: &str = "settings.toml";

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "The settings file shared with running engines. The default is `settings.toml`."
    )]
    pub store: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "The path to the tuning config file. The default is `config.toml`."
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show whether auto-scroll is on and the current delay.
    Status {
        #[arg(long, help = "Print the settings as JSON.")]
        json: bool,
    },
    /// Turn auto-scroll on.
    Enable,
    /// Turn auto-scroll off. Running engines stop immediately.
    Disable,
    /// Set the wait between the end of a video and scrolling to the next one.
    Delay { seconds: f64 },
    /// Print the effective tuning config.
    Config,
}

pub fn status_line(settings: &Settings) -> &'static str {
    if settings.enabled {
        "It's Scrolling Time.."
    } else {
        "Auto-Scroll Disabled"
    }
}

pub fn start() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("FEED_ADVANCER_LOG")
        .init();

    let cli = Cli::parse();
    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

    match cli.command {
        Command::Config => {
            let config = Config::load(cli.config.as_deref())?;
            let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
            println!("{rendered}");
        }
        Command::Status { json } => {
            let store = FileSettingsStore::open(&store_path)?;
            let settings = Settings::from_stored(&store.get()?);
            if json {
                let body = serde_json::json!({
                    "enabled": settings.enabled,
                    "delayMs": settings.delay.as_millis() as u64,
                });
                println!("{body}");
            } else {
                println!("{}", status_line(&settings));
                println!("Delay: {:?}", settings.delay);
            }
        }
        Command::Enable => set_enabled(&store_path, true)?,
        Command::Disable => set_enabled(&store_path, false)?,
        Command::Delay { seconds } => {
            if delay_from_secs(seconds).is_none() {
                bail!("Delay must be a non-negative number of seconds, got {seconds}");
            }
            let store = FileSettingsStore::open(&store_path)?;
            store.set(&StoredSettings {
                auto_scroll_enabled: None,
                scroll_delay: Some(seconds),
            })?;
            log::info!("Scroll delay updated to: {seconds}");
        }
    }

    Ok(())
}

fn set_enabled(store_path: &Path, enabled: bool) -> anyhow::Result<()> {
    let store = FileSettingsStore::open(store_path)?;
    store.set(&StoredSettings {
        auto_scroll_enabled: Some(enabled),
        scroll_delay: None,
    })?;
    let settings = Settings::from_stored(&store.get()?);
    println!("{}", status_line(&settings));
    Ok(())
}
