use crate::{
    config::DetectionConfig,
    page::{ElementId, MediaEvent, MediaEventKind, Page},
    utils::distance,
};

const OBSERVED_EVENTS: [MediaEventKind; 2] = [MediaEventKind::Ended, MediaEventKind::Progress];

pub type EndCallback = Box<dyn FnMut(ElementId) + Send>;

/// Picks the visible video whose center is closest to the viewport center.
/// Equidistant videos resolve to the first one in document order.
pub fn select_candidate(page: &impl Page) -> Option<ElementId> {
    let viewport_center = page.viewport().center();

    let mut closest: Option<(ElementId, f64)> = None;
    for id in page.media_elements() {
        let Some(rect) = page.bounding_rect(id) else {
            continue;
        };
        if rect.is_empty() {
            continue;
        }
        let dist = distance(rect.center(), viewport_center);
        if !dist.is_finite() {
            continue;
        }
        if closest.map_or(true, |(_, min)| dist < min) {
            closest = Some((id, dist));
        }
    }
    closest.map(|(id, _)| id)
}

struct Session {
    candidate: ElementId,
    on_end: EndCallback,
    fired: bool,
}

impl Session {
    fn fire(&mut self) {
        self.fired = true;
        (self.on_end)(self.candidate);
    }
}

pub struct MediaObserver {
    config: DetectionConfig,
    session: Option<Session>,
}

impl MediaObserver {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn bound(&self) -> Option<ElementId> {
        self.session.as_ref().map(|s| s.candidate)
    }

    pub fn has_fired(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.fired)
    }

    /// Starts watching `candidate`. Re-binding the candidate that is already
    /// bound keeps the existing session and callback.
    pub fn bind(&mut self, page: &mut impl Page, candidate: ElementId, on_end: EndCallback) {
        if self.bound() == Some(candidate) {
            return;
        }
        self.release(page);

        log::info!("Locking onto video {candidate}");
        for kind in OBSERVED_EVENTS {
            page.add_media_listener(candidate, kind);
        }
        self.session = Some(Session {
            candidate,
            on_end,
            fired: false,
        });
    }

    pub fn release(&mut self, page: &mut impl Page) {
        let Some(session) = self.session.take() else {
            return;
        };
        for kind in OBSERVED_EVENTS {
            page.remove_media_listener(session.candidate, kind);
        }
        log::debug!("Released video {}", session.candidate);
    }

    /// Feeds an event delivered by the page. Events for anything other than
    /// the bound candidate are dropped.
    pub fn handle_event(&mut self, page: &impl Page, event: MediaEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if event.target != session.candidate || session.fired {
            return;
        }

        match event.kind {
            MediaEventKind::Ended => {
                log::info!("Video {} ended", session.candidate);
                session.fire();
            }
            MediaEventKind::Progress => {
                let Some(state) = page.media_state(session.candidate) else {
                    return;
                };
                if state.paused || is_overlay_present(page, &self.config) {
                    return;
                }
                if state.duration > 0.0
                    && state.current_time > state.duration - self.config.end_guard_secs
                {
                    log::info!(
                        "Video {} nearing end (loop detection) at {:.2}/{:.2}",
                        session.candidate,
                        state.current_time,
                        state.duration
                    );
                    session.fire();
                }
            }
        }
    }
}

pub fn is_overlay_present(page: &impl Page, config: &DetectionConfig) -> bool {
    let text = page.page_text();
    if config
        .warning_phrases
        .iter()
        .any(|phrase| text.contains(phrase.as_str()))
    {
        return true;
    }
    page.button_texts().iter().any(|button| {
        config
            .reveal_phrases
            .iter()
            .any(|phrase| button.contains(phrase.as_str()))
    })
}
