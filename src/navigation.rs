use crate::{
    config::NavigationConfig,
    page::{ElementId, KeyPhase, KeyTarget, Overflow, Page, ScrollBehavior, ARROW_DOWN},
};

const CLICKABLE_SELECTORS: [&str; 2] = [r#"[role="button"]"#, "button"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ScrollContainer(ElementId),
    NextControl(ElementId),
    Viewport,
}

pub struct Navigator {
    config: NavigationConfig,
}

impl Navigator {
    pub fn new(config: NavigationConfig) -> Self {
        Self { config }
    }

    /// The global `ArrowDown` press always goes out first but never counts as
    /// success on its own.
    pub fn advance(&self, page: &mut impl Page, context: Option<ElementId>) -> Strategy {
        log::info!("Performing scroll action...");

        release_text_focus(page);
        press_down(page, KeyTarget::Document);

        if let Some(container) = find_scroll_container(&*page, context) {
            let Some(metrics) = page.scroll_metrics(container) else {
                return self.fallback(page);
            };
            log::info!("Scrolling container {container}");
            page.scroll_by(container, metrics.client_height, ScrollBehavior::Smooth);
            page.focus(container, true);
            press_down(page, KeyTarget::Element(container));
            return Strategy::ScrollContainer(container);
        }

        self.fallback(page)
    }

    fn fallback(&self, page: &mut impl Page) -> Strategy {
        if let Some(control) = self.click_next_control(page) {
            log::info!("Clicked next control {control}");
            return Strategy::NextControl(control);
        }

        log::info!("No scroll container or next control found, scrolling the viewport");
        let height = page.viewport().height;
        page.scroll_viewport_by(height, ScrollBehavior::Smooth);
        Strategy::Viewport
    }

    fn click_next_control(&self, page: &mut impl Page) -> Option<ElementId> {
        let found = self
            .config
            .next_control_selectors
            .iter()
            .find_map(|selector| page.query_selector_all(selector).into_iter().next())?;

        let clickable = CLICKABLE_SELECTORS
            .iter()
            .find_map(|selector| page.closest(found, selector))
            .unwrap_or(found);
        page.click(clickable);
        Some(clickable)
    }
}

fn release_text_focus(page: &mut impl Page) {
    if let Some(active) = page.active_element() {
        if page.is_text_input(active) {
            log::info!("Input focused, blurring to allow scroll");
            page.blur(active);
        }
    }
    page.focus_document();
}

fn press_down(page: &mut impl Page, target: KeyTarget) {
    page.dispatch_key(target, KeyPhase::Down, &ARROW_DOWN);
    page.dispatch_key(target, KeyPhase::Up, &ARROW_DOWN);
}

fn find_scroll_container(page: &impl Page, context: Option<ElementId>) -> Option<ElementId> {
    let start = match context.filter(|id| page.is_attached(*id)) {
        Some(id) => id,
        None => {
            let (x, y) = page.viewport().center();
            page.element_at(x, y)?
        }
    };
    let body = page.body();

    let mut current = Some(start);
    while let Some(el) = current {
        if Some(el) == body {
            break;
        }
        if is_scroll_container(page, el) {
            return Some(el);
        }
        current = page.parent(el);
    }
    None
}

fn is_scroll_container(page: &impl Page, id: ElementId) -> bool {
    let scrolls = page
        .computed_overflow_y(id)
        .is_some_and(|value| Overflow::parse(&value).allows_scrolling());
    scrolls && page.scroll_metrics(id).is_some_and(|m| m.overflows())
}
