use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle, time};

use crate::{
    engine::{EngineHandle, EngineMsg},
    settings::{SettingsDelta, StoredSettings},
};

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
    snapshot: Arc<Mutex<StoredSettings>>,
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<SettingsDelta>>>>,
}

impl FileSettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let snapshot = read_file(&path)?;
        Ok(Self {
            path,
            snapshot: Arc::new(Mutex::new(snapshot)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> anyhow::Result<StoredSettings> {
        let current = read_file(&self.path)?;
        self.update_snapshot(current.clone());
        Ok(current)
    }

    /// Merges `update` into the stored settings and notifies subscribers of
    /// whatever actually changed.
    pub fn set(&self, update: &StoredSettings) -> anyhow::Result<()> {
        let mut next = read_file(&self.path)?;
        next.merge(update);

        let contents = toml::to_string(&next).context("Failed to serialize settings")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;

        self.update_snapshot(next);
        Ok(())
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SettingsDelta> {
        let (delta_tx, delta_rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(delta_tx);
        delta_rx
    }

    /// Polls the file for changes made outside this store. Stops once every
    /// subscriber has gone away.
    pub fn watch(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            loop {
                ticker.tick().await;
                let listening = {
                    let mut subscribers = store.subscribers.lock();
                    subscribers.retain(|subscriber| !subscriber.is_closed());
                    !subscribers.is_empty()
                };
                if !listening {
                    log::debug!("No settings subscribers left, stopping watch");
                    break;
                }
                match read_file(&store.path) {
                    Ok(current) => store.update_snapshot(current),
                    Err(err) => log::warn!("Failed to poll settings file: {err:?}"),
                }
            }
        })
    }

    /// Delivers the current settings to `engine`, then forwards every change
    /// until the engine stops.
    pub fn connect(&self, engine: EngineHandle) -> JoinHandle<()> {
        let store = self.clone();
        let mut delta_rx = self.subscribe();
        tokio::spawn(async move {
            let initial = match store.get() {
                Ok(settings) => settings,
                Err(err) => {
                    log::error!("Failed to load settings, using defaults: {err:?}");
                    StoredSettings::default()
                }
            };
            if engine
                .send_message(EngineMsg::SettingsLoaded(initial))
                .await
                .is_err()
            {
                return;
            }
            while let Some(delta) = delta_rx.recv().await {
                if let Err(err) = engine.send_message(EngineMsg::SettingsChanged(delta)).await {
                    log::debug!("Stopped forwarding settings: {err}");
                    return;
                }
            }
        })
    }

    fn update_snapshot(&self, current: StoredSettings) {
        let delta = {
            let mut snapshot = self.snapshot.lock();
            let delta = SettingsDelta::between(&snapshot, &current);
            *snapshot = current;
            delta
        };
        if let Some(delta) = delta {
            log::debug!("Settings changed: {delta:?}");
            self.subscribers
                .lock()
                .retain(|subscriber| subscriber.send(delta.clone()).is_ok());
        }
    }
}

fn read_file(path: &Path) -> anyhow::Result<StoredSettings> {
    if !path.exists() {
        return Ok(StoredSettings::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    toml::from_str(&contents).context("Failed to parse settings file")
}
