use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Seconds before the end of a looping video at which it counts as finished.
    pub end_guard_secs: f64,
    pub warning_phrases: Vec<String>,
    pub reveal_phrases: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            end_guard_secs: 0.75,
            warning_phrases: vec![
                "Sensitive Content".to_string(),
                "Content Warning".to_string(),
                "Sensitive content".to_string(),
            ],
            reveal_phrases: vec!["Watch Reel".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub rescan_interval_ms: u64,
    pub settle_margin_ms: u64,
}

impl AcquisitionConfig {
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms.max(1))
    }

    pub fn settle_margin(&self) -> Duration {
        Duration::from_millis(self.settle_margin_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            rescan_interval_ms: 2000,
            settle_margin_ms: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Tried in order; the first selector with a match wins.
    pub next_control_selectors: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            next_control_selectors: [
                r#"div[role="button"][aria-label="Next"]"#,
                r#"button[aria-label="Next"]"#,
                r#"button[aria-label="Next Reel"]"#,
                r#"svg[aria-label="Next"]"#,
                r#"svg[aria-label="Next Reel"]"#,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub acquisition: AcquisitionConfig,
    pub navigation: NavigationConfig,
}

impl Config {
    pub fn read(file: &mut impl Read) -> anyhow::Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file")?;

        let config: Self = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path).context("Failed to open config file")?;
        Self::read(&mut file)
    }

    /// Reads `path` if given, otherwise `config.toml` if it exists, otherwise
    /// falls back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(config_path) => Self::read_path(config_path),
            None => {
                let default_config = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_config.exists() {
                    log::info!("Using default config file {DEFAULT_CONFIG_PATH}");
                    Self::read_path(default_config)
                } else {
                    log::warn!("No config file found; using default config");
                    Ok(Config::default())
                }
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let guard = self.detection.end_guard_secs;
        if !guard.is_finite() || guard < 0.0 {
            bail!("detection.end_guard_secs must be a non-negative number, got {guard}");
        }
        if self.acquisition.rescan_interval_ms == 0 {
            bail!("acquisition.rescan_interval_ms must be greater than zero");
        }
        Ok(())
    }
}
