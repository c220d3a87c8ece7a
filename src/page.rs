use crate::id_type;

id_type!(ElementId);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaState {
    pub paused: bool,
    pub current_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn overflows(&self) -> bool {
        self.scroll_height > self.client_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    Ended,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaEvent {
    pub target: ElementId,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn ended(target: ElementId) -> Self {
        Self {
            target,
            kind: MediaEventKind::Ended,
        }
    }

    pub fn progress(target: ElementId) -> Self {
        Self {
            target,
            kind: MediaEventKind::Progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    Document,
    Element(ElementId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: &'static str,
    pub code: &'static str,
    pub key_code: u32,
}

pub const ARROW_DOWN: KeyStroke = KeyStroke {
    key: "ArrowDown",
    code: "ArrowDown",
    key_code: 40,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
}

impl Overflow {
    /// Unknown keywords are treated as `visible`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "auto" => Self::Auto,
            "scroll" => Self::Scroll,
            "hidden" => Self::Hidden,
            "clip" => Self::Clip,
            _ => Self::Visible,
        }
    }

    pub fn allows_scrolling(self) -> bool {
        matches!(self, Self::Auto | Self::Scroll)
    }
}

/// Every method is infallible: a missing or detached element is reported as
/// `None`/`false`, and actions on such elements are silently dropped by the
/// implementation.
pub trait Page {
    fn media_elements(&self) -> Vec<ElementId>;
    fn bounding_rect(&self, id: ElementId) -> Option<Rect>;
    fn viewport(&self) -> Viewport;
    fn media_state(&self, id: ElementId) -> Option<MediaState>;
    fn is_attached(&self, id: ElementId) -> bool;
    fn element_at(&self, x: f64, y: f64) -> Option<ElementId>;
    fn parent(&self, id: ElementId) -> Option<ElementId>;
    fn body(&self) -> Option<ElementId>;
    fn computed_overflow_y(&self, id: ElementId) -> Option<String>;
    fn scroll_metrics(&self, id: ElementId) -> Option<ScrollMetrics>;
    fn page_text(&self) -> String;
    fn button_texts(&self) -> Vec<String>;
    fn active_element(&self) -> Option<ElementId>;
    fn is_text_input(&self, id: ElementId) -> bool;
    fn query_selector_all(&self, selector: &str) -> Vec<ElementId>;
    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, id: ElementId, selector: &str) -> Option<ElementId>;

    fn add_media_listener(&mut self, id: ElementId, kind: MediaEventKind);
    fn remove_media_listener(&mut self, id: ElementId, kind: MediaEventKind);
    fn dispatch_key(&mut self, target: KeyTarget, phase: KeyPhase, key: &KeyStroke);
    fn blur(&mut self, id: ElementId);
    fn focus(&mut self, id: ElementId, prevent_scroll: bool);
    fn focus_document(&mut self);
    fn scroll_by(&mut self, id: ElementId, top: f64, behavior: ScrollBehavior);
    fn scroll_viewport_by(&mut self, top: f64, behavior: ScrollBehavior);
    fn click(&mut self, id: ElementId);
}
