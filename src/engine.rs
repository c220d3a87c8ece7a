use std::time::Duration;

use anyhow::anyhow;
use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    config::{AcquisitionConfig, Config},
    navigation::Navigator,
    observer::{select_candidate, MediaObserver},
    page::{ElementId, MediaEvent, Page, Visibility},
    schedule::TaskSlot,
    settings::{Settings, SettingsDelta, StoredSettings, Transition},
};

#[derive(Debug, Clone)]
pub enum EngineMsg {
    SettingsLoaded(StoredSettings),
    SettingsChanged(SettingsDelta),
    Media(MediaEvent),
    PageMutated,
    VisibilityChanged(Visibility),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    SettingsLoaded,
    SettingsChanged,
    PageMutated,
    BecameVisible,
    Interval,
    Settled,
}

#[derive(Debug, Clone)]
pub struct EngineHandle {
    message_tx: mpsc::Sender<EngineMsg>,
}

impl EngineHandle {
    #[cfg(test)]
    pub(crate) fn from_sender(message_tx: mpsc::Sender<EngineMsg>) -> Self {
        Self { message_tx }
    }

    pub async fn send_message(&self, msg: EngineMsg) -> anyhow::Result<()> {
        self.message_tx
            .send(msg)
            .await
            .map_err(|_| anyhow!("Engine is no longer running"))
    }

    /// For hosts that deliver events from synchronous callbacks. Returns
    /// `false` if the message was dropped.
    pub fn try_send_message(&self, msg: EngineMsg) -> bool {
        match self.message_tx.try_send(msg) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Dropping engine message: {err}");
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.message_tx.is_closed()
    }
}

pub struct Engine<P: Page> {
    page: P,
    settings: Settings,
    timing: AcquisitionConfig,
    observer: MediaObserver,
    navigator: Navigator,
    navigation: TaskSlot<ElementId>,
    settle: TaskSlot<()>,
    rescan_period: Duration,
    message_rx: mpsc::Receiver<EngineMsg>,
    ended_tx: mpsc::UnboundedSender<ElementId>,
    ended_rx: mpsc::UnboundedReceiver<ElementId>,
}

impl<P: Page> Engine<P> {
    pub fn new(page: P, config: Config) -> (Self, EngineHandle) {
        let (message_tx, message_rx) = mpsc::channel::<EngineMsg>(64);
        let (ended_tx, ended_rx) = mpsc::unbounded_channel::<ElementId>();
        let rescan_period = config.acquisition.rescan_interval();

        let engine = Self {
            page,
            settings: Settings::default(),
            timing: config.acquisition,
            observer: MediaObserver::new(config.detection),
            navigator: Navigator::new(config.navigation),
            navigation: TaskSlot::new("navigation"),
            settle: TaskSlot::new("settle"),
            rescan_period,
            message_rx,
            ended_tx,
            ended_rx,
        };
        (engine, EngineHandle { message_tx })
    }

    pub async fn run(mut self) {
        log::info!("Initializing...");
        let period = self.rescan_period;
        let mut rescan = time::interval_at(Instant::now() + period, period);
        rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = self.message_rx.recv() => {
                    match msg {
                        Some(EngineMsg::Shutdown) => break,
                        Some(msg) => self.handle_msg(msg),
                        None => {
                            log::debug!("All engine handles dropped");
                            break;
                        }
                    }
                }
                Some(candidate) = self.ended_rx.recv() => self.handle_ended(candidate),
                _ = rescan.tick() => self.handle_trigger(Trigger::Interval),
                context = self.navigation.next_due() => {
                    let strategy = self.navigator.advance(&mut self.page, Some(context));
                    log::debug!("Navigation finished via {strategy:?}");
                }
                () = self.settle.next_due() => {
                    self.observer.release(&mut self.page);
                    self.handle_trigger(Trigger::Settled);
                }
            }
        }
        self.idle();
        log::info!("Stopped");
    }

    fn handle_msg(&mut self, msg: EngineMsg) {
        match msg {
            EngineMsg::SettingsLoaded(stored) => {
                self.settings = Settings::from_stored(&stored);
                log::info!(
                    "Loaded settings: enabled={}, delay={:?}",
                    self.settings.enabled,
                    self.settings.delay
                );
                self.handle_trigger(Trigger::SettingsLoaded);
            }
            EngineMsg::SettingsChanged(delta) => {
                if self.settings.apply(&delta) == Transition::Disabled {
                    log::info!("Auto-scroll disabled");
                    self.idle();
                }
                self.handle_trigger(Trigger::SettingsChanged);
            }
            EngineMsg::Media(event) => self.observer.handle_event(&self.page, event),
            EngineMsg::PageMutated => self.handle_trigger(Trigger::PageMutated),
            EngineMsg::VisibilityChanged(Visibility::Visible) => {
                log::info!("Tab visible, refreshing detection");
                self.handle_trigger(Trigger::BecameVisible);
            }
            EngineMsg::VisibilityChanged(Visibility::Hidden) => {}
            EngineMsg::Shutdown => {}
        }
    }

    fn handle_trigger(&mut self, trigger: Trigger) {
        if !self.settings.enabled {
            self.idle();
            return;
        }
        log::trace!("Rescanning after {trigger:?}");

        let Some(candidate) = select_candidate(&self.page) else {
            return;
        };
        // A different video in view means the feed already moved on.
        if self.observer.bound().is_some_and(|bound| bound != candidate) && self.navigation.cancel()
        {
            log::info!("Active video changed, dropping pending scroll");
            self.settle.cancel();
        }
        let ended_tx = self.ended_tx.clone();
        self.observer.bind(
            &mut self.page,
            candidate,
            Box::new(move |id: ElementId| {
                let _ = ended_tx.send(id);
            }),
        );
    }

    fn handle_ended(&mut self, candidate: ElementId) {
        if !self.settings.enabled {
            return;
        }
        // The observer may have moved to another video since it queued this.
        if self.observer.bound() != Some(candidate) || !self.observer.has_fired() {
            log::debug!("Ignoring end of superseded video {candidate}");
            return;
        }
        let delay = self.settings.delay;
        log::info!("Video ended, scrolling in {delay:?}");
        self.navigation.schedule(delay, candidate);
        self.settle.schedule(delay + self.timing.settle_margin(), ());
    }

    fn idle(&mut self) {
        self.navigation.cancel();
        self.settle.cancel();
        self.observer.release(&mut self.page);
    }
}
