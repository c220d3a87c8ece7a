use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::page::{
    ElementId, KeyPhase, KeyStroke, KeyTarget, MediaEventKind, MediaState, Page, Rect,
    ScrollBehavior, ScrollMetrics, Viewport,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddListener(ElementId, MediaEventKind),
    RemoveListener(ElementId, MediaEventKind),
    Key(KeyTarget, KeyPhase),
    Blur(ElementId),
    Focus(ElementId, bool),
    FocusDocument,
    ScrollBy(ElementId, f64, ScrollBehavior),
    ScrollViewport(f64, ScrollBehavior),
    Click(ElementId),
}

#[derive(Debug)]
struct FakeElement {
    parent: Option<ElementId>,
    is_video: bool,
    attached: bool,
    rect: Option<Rect>,
    overflow_y: String,
    metrics: Option<ScrollMetrics>,
    media: Option<MediaState>,
    selectors: Vec<String>,
    text_input: bool,
}

impl FakeElement {
    fn new(parent: Option<ElementId>) -> Self {
        Self {
            parent,
            is_video: false,
            attached: true,
            rect: None,
            overflow_y: "visible".to_string(),
            metrics: None,
            media: None,
            selectors: Vec::new(),
            text_input: false,
        }
    }
}

#[derive(Debug)]
struct FakeDom {
    elements: HashMap<ElementId, FakeElement>,
    order: Vec<ElementId>,
    body: ElementId,
    viewport: Viewport,
    text: String,
    buttons: Vec<String>,
    active: Option<ElementId>,
    at_center: Option<ElementId>,
    actions: Vec<Action>,
}

/// In-memory document whose clones share state, so a test can keep a handle
/// while the engine owns another.
#[derive(Debug, Clone)]
pub struct FakePage {
    dom: Arc<Mutex<FakeDom>>,
}

impl FakePage {
    pub fn new() -> Self {
        let body = ElementId::new();
        let mut elements = HashMap::new();
        elements.insert(body, FakeElement::new(None));
        Self {
            dom: Arc::new(Mutex::new(FakeDom {
                elements,
                order: vec![body],
                body,
                viewport: Viewport {
                    width: 1000.0,
                    height: 800.0,
                },
                text: String::new(),
                buttons: Vec::new(),
                active: None,
                at_center: None,
                actions: Vec::new(),
            })),
        }
    }

    pub fn body_id(&self) -> ElementId {
        self.dom.lock().body
    }

    pub fn add_element(&self, parent: ElementId) -> ElementId {
        let id = ElementId::new();
        let mut dom = self.dom.lock();
        dom.elements.insert(id, FakeElement::new(Some(parent)));
        dom.order.push(id);
        id
    }

    /// A playing ten second video at `rect`.
    pub fn add_video(&self, parent: ElementId, rect: Rect) -> ElementId {
        let id = self.add_element(parent);
        let mut dom = self.dom.lock();
        let element = dom.elements.get_mut(&id).unwrap();
        element.is_video = true;
        element.rect = Some(rect);
        element.media = Some(MediaState {
            paused: false,
            current_time: 0.0,
            duration: 10.0,
        });
        id
    }

    pub fn set_media(&self, id: ElementId, paused: bool, current_time: f64, duration: f64) {
        self.dom.lock().elements.get_mut(&id).unwrap().media = Some(MediaState {
            paused,
            current_time,
            duration,
        });
    }

    pub fn set_scrollable(
        &self,
        id: ElementId,
        overflow_y: &str,
        scroll_height: f64,
        client_height: f64,
    ) {
        let mut dom = self.dom.lock();
        let element = dom.elements.get_mut(&id).unwrap();
        element.overflow_y = overflow_y.to_string();
        element.metrics = Some(ScrollMetrics {
            scroll_height,
            client_height,
        });
    }

    pub fn add_selector(&self, id: ElementId, selector: &str) {
        self.dom
            .lock()
            .elements
            .get_mut(&id)
            .unwrap()
            .selectors
            .push(selector.to_string());
    }

    pub fn set_text_input(&self, id: ElementId) {
        self.dom.lock().elements.get_mut(&id).unwrap().text_input = true;
    }

    pub fn detach(&self, id: ElementId) {
        self.dom.lock().elements.get_mut(&id).unwrap().attached = false;
    }

    pub fn set_text(&self, text: &str) {
        self.dom.lock().text = text.to_string();
    }

    pub fn add_button(&self, text: &str) {
        self.dom.lock().buttons.push(text.to_string());
    }

    pub fn set_active(&self, id: ElementId) {
        self.dom.lock().active = Some(id);
    }

    pub fn set_element_at_center(&self, id: ElementId) {
        self.dom.lock().at_center = Some(id);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.dom.lock().actions.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Action) -> bool) -> usize {
        self.dom.lock().actions.iter().filter(|&a| predicate(a)).count()
    }

    /// Listener registrations that have not been removed again.
    pub fn active_listeners(&self, id: ElementId) -> usize {
        let added = self.count(|a| matches!(a, Action::AddListener(target, _) if *target == id));
        let removed =
            self.count(|a| matches!(a, Action::RemoveListener(target, _) if *target == id));
        added - removed
    }

    pub fn navigation_count(&self) -> usize {
        self.count(|a| matches!(a, Action::Key(KeyTarget::Document, KeyPhase::Down)))
    }

    fn record(&mut self, action: Action) {
        self.dom.lock().actions.push(action);
    }
}

impl Page for FakePage {
    fn media_elements(&self) -> Vec<ElementId> {
        let dom = self.dom.lock();
        dom.order
            .iter()
            .copied()
            .filter(|id| {
                let element = &dom.elements[id];
                element.is_video && element.attached
            })
            .collect()
    }

    fn bounding_rect(&self, id: ElementId) -> Option<Rect> {
        let dom = self.dom.lock();
        dom.elements.get(&id).filter(|e| e.attached).and_then(|e| e.rect)
    }

    fn viewport(&self) -> Viewport {
        self.dom.lock().viewport
    }

    fn media_state(&self, id: ElementId) -> Option<MediaState> {
        self.dom.lock().elements.get(&id).and_then(|e| e.media)
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.dom.lock().elements.get(&id).is_some_and(|e| e.attached)
    }

    fn element_at(&self, _x: f64, _y: f64) -> Option<ElementId> {
        self.dom.lock().at_center
    }

    fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.dom.lock().elements.get(&id).and_then(|e| e.parent)
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.dom.lock().body)
    }

    fn computed_overflow_y(&self, id: ElementId) -> Option<String> {
        self.dom.lock().elements.get(&id).map(|e| e.overflow_y.clone())
    }

    fn scroll_metrics(&self, id: ElementId) -> Option<ScrollMetrics> {
        self.dom.lock().elements.get(&id).and_then(|e| e.metrics)
    }

    fn page_text(&self) -> String {
        self.dom.lock().text.clone()
    }

    fn button_texts(&self) -> Vec<String> {
        self.dom.lock().buttons.clone()
    }

    fn active_element(&self) -> Option<ElementId> {
        self.dom.lock().active
    }

    fn is_text_input(&self, id: ElementId) -> bool {
        self.dom.lock().elements.get(&id).is_some_and(|e| e.text_input)
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let dom = self.dom.lock();
        dom.order
            .iter()
            .copied()
            .filter(|id| {
                let element = &dom.elements[id];
                element.attached && element.selectors.iter().any(|s| s == selector)
            })
            .collect()
    }

    fn closest(&self, id: ElementId, selector: &str) -> Option<ElementId> {
        let dom = self.dom.lock();
        let mut current = Some(id);
        while let Some(el) = current {
            let element = dom.elements.get(&el)?;
            if element.selectors.iter().any(|s| s == selector) {
                return Some(el);
            }
            current = element.parent;
        }
        None
    }

    fn add_media_listener(&mut self, id: ElementId, kind: MediaEventKind) {
        self.record(Action::AddListener(id, kind));
    }

    fn remove_media_listener(&mut self, id: ElementId, kind: MediaEventKind) {
        self.record(Action::RemoveListener(id, kind));
    }

    fn dispatch_key(&mut self, target: KeyTarget, phase: KeyPhase, _key: &KeyStroke) {
        self.record(Action::Key(target, phase));
    }

    fn blur(&mut self, id: ElementId) {
        self.record(Action::Blur(id));
        let mut dom = self.dom.lock();
        if dom.active == Some(id) {
            dom.active = None;
        }
    }

    fn focus(&mut self, id: ElementId, prevent_scroll: bool) {
        self.record(Action::Focus(id, prevent_scroll));
    }

    fn focus_document(&mut self) {
        self.record(Action::FocusDocument);
    }

    fn scroll_by(&mut self, id: ElementId, top: f64, behavior: ScrollBehavior) {
        self.record(Action::ScrollBy(id, top, behavior));
    }

    fn scroll_viewport_by(&mut self, top: f64, behavior: ScrollBehavior) {
        self.record(Action::ScrollViewport(top, behavior));
    }

    fn click(&mut self, id: ElementId) {
        self.record(Action::Click(id));
    }
}
