use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENABLED: bool = true;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// Settings as persisted by the store. `scroll_delay` is in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scroll_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_delay: Option<f64>,
}

impl StoredSettings {
    pub fn merge(&mut self, update: &StoredSettings) {
        if update.auto_scroll_enabled.is_some() {
            self.auto_scroll_enabled = update.auto_scroll_enabled;
        }
        if update.scroll_delay.is_some() {
            self.scroll_delay = update.scroll_delay;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<T>,
}

impl<T> StorageChange<T> {
    pub fn new(new_value: Option<T>) -> Self {
        Self { new_value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scroll_enabled: Option<StorageChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_delay: Option<StorageChange<f64>>,
}

impl SettingsDelta {
    /// Parses a change notification in its JSON wire shape, e.g.
    /// `{"autoScrollEnabled": {"newValue": false}}`. Unknown keys are ignored.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings change")
    }

    pub fn between(old: &StoredSettings, new: &StoredSettings) -> Option<Self> {
        let delta = Self {
            auto_scroll_enabled: (old.auto_scroll_enabled != new.auto_scroll_enabled)
                .then(|| StorageChange::new(new.auto_scroll_enabled)),
            scroll_delay: (old.scroll_delay != new.scroll_delay)
                .then(|| StorageChange::new(new.scroll_delay)),
        };
        (!delta.is_empty()).then_some(delta)
    }

    pub fn is_empty(&self) -> bool {
        self.auto_scroll_enabled.is_none() && self.scroll_delay.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enabled,
    Disabled,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    pub delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            delay: DEFAULT_DELAY,
        }
    }
}

impl Settings {
    pub fn from_stored(stored: &StoredSettings) -> Self {
        let mut settings = Self {
            enabled: stored.auto_scroll_enabled.unwrap_or(DEFAULT_ENABLED),
            ..Self::default()
        };
        settings.set_delay_secs(stored.scroll_delay);
        settings
    }

    /// Applies a change notification in place and reports whether the gate
    /// opened or closed. A removed switch reads as off; a removed delay
    /// reverts to the default.
    pub fn apply(&mut self, delta: &SettingsDelta) -> Transition {
        let was_enabled = self.enabled;

        if let Some(change) = &delta.auto_scroll_enabled {
            self.enabled = change.new_value.unwrap_or(false);
        }
        if let Some(change) = &delta.scroll_delay {
            self.set_delay_secs(change.new_value);
        }

        match (was_enabled, self.enabled) {
            (false, true) => Transition::Enabled,
            (true, false) => Transition::Disabled,
            _ => Transition::Unchanged,
        }
    }

    fn set_delay_secs(&mut self, secs: Option<f64>) {
        let Some(secs) = secs else {
            self.delay = DEFAULT_DELAY;
            return;
        };
        match delay_from_secs(secs) {
            Some(delay) => self.delay = delay,
            None => log::warn!("Ignoring invalid scroll delay {secs}; keeping {:?}", self.delay),
        }
    }
}

/// Converts a stored delay in seconds, rejecting negative or non-finite values.
pub fn delay_from_secs(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_millis((secs * 1000.0).round() as u64))
}
