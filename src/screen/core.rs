use std::sync::{Arc, Mutex};

use crate::buffer::RenderBuffer;
use crate::element::{ClickArea, Element};
use crate::error::{MenuError, Result};
use crate::host::{ClickEvent, ContainerId, ViewerId};
use crate::runtime::ClickContext;
use crate::visual::VisualItem;

/// Neutral colour marker prepended to every title so the host's default
/// styling does not bleed into it.
pub const TITLE_RESET_PREFIX: &str = "&0";

/// Shared handle to a screen. Identity is pointer identity: two screens
/// configured the same way stay distinct session entries.
pub type SharedScreen = Arc<Mutex<dyn Screen>>;

/// Wrap a screen for sharing with the runtime and the session registry.
pub fn share<S: Screen + 'static>(screen: S) -> SharedScreen {
    Arc::new(Mutex::new(screen))
}

/// Behaviour contract for a navigable unit of UI.
///
/// Concrete screens own a [`ScreenState`] (built once in their constructor)
/// and override the content function plus whichever hooks they need. Declared
/// elements go into the state builder; anything dynamic comes back from
/// [`Screen::manual_elements`] on every registration pass.
pub trait Screen: Send + std::fmt::Debug {
    fn state(&self) -> &ScreenState;

    fn state_mut(&mut self) -> &mut ScreenState;

    /// Short label used in logs and error messages.
    fn name(&self) -> &str {
        "screen"
    }

    /// Content function: the item rendered at `slot`, if any.
    fn item_at(&self, _slot: usize) -> Option<VisualItem> {
        None
    }

    /// Description lines for the info element; `None` skips the element.
    fn info(&self) -> Option<Vec<String>> {
        None
    }

    /// Elements to register on top of the declared ones, re-collected on
    /// every registration pass.
    fn manual_elements(&self) -> Vec<Element> {
        Vec::new()
    }

    /// Slot the info element lands on.
    fn info_slot(&self, size: usize) -> usize {
        size - 9
    }

    /// Slot the return element lands on.
    fn return_slot(&self, size: usize) -> usize {
        size - 1
    }

    /// Whether the return element is added at all.
    fn show_return(&self) -> bool {
        true
    }

    /// Produce a fresh instance of this screen, used by return elements
    /// configured to rebuild their target.
    fn new_instance(&self) -> Result<SharedScreen> {
        Err(MenuError::NewInstanceUnsupported(self.name().to_string()))
    }

    /// Last-minute buffer edits before the open notification goes out.
    fn on_display(&mut self, _buffer: &mut RenderBuffer) {}

    /// A registered element was clicked. Default: run its handler.
    fn on_element_click(
        &mut self,
        ctx: &mut ClickContext,
        event: &ClickEvent,
        element: &Element,
    ) -> Result<()> {
        element.click(ctx, event.viewer, event.click)
    }

    /// A click matched no registered element. Default: forward to
    /// [`Screen::on_slot_click`].
    fn on_menu_click(&mut self, ctx: &mut ClickContext, event: &ClickEvent) -> Result<()> {
        let _ = ctx;
        self.on_slot_click(event.viewer, event.slot, event.clicked.as_ref())
    }

    /// Simplified fallback hook; no-op by default.
    fn on_slot_click(
        &mut self,
        _viewer: ViewerId,
        _slot: usize,
        _clicked: Option<&VisualItem>,
    ) -> Result<()> {
        Ok(())
    }

    /// The viewer closed the container.
    fn on_close(&mut self, _viewer: ViewerId, _container: ContainerId) {}

    /// Whether a click or drag should be let through.
    #[deprecated(note = "host packet ordering makes this unreliable, do not depend on it")]
    fn action_allowed(
        &self,
        _area: ClickArea,
        _slot: usize,
        _clicked: Option<&VisualItem>,
        _cursor: Option<&VisualItem>,
    ) -> bool {
        false
    }
}

/// Elements declared at construction time, frozen once built.
#[derive(Debug)]
pub(crate) enum Declared {
    Single(Element),
    Group { members: Vec<Element> },
}

/// State every concrete screen owns: size, title, parent link, declared
/// elements, the registered element set and the bound viewer.
#[derive(Debug)]
pub struct ScreenState {
    size: usize,
    title: Option<String>,
    parent: Option<SharedScreen>,
    return_element: Element,
    declared: Vec<Declared>,
    elements: Vec<Element>,
    registered: bool,
    viewer: Option<ViewerId>,
}

impl ScreenState {
    pub fn builder() -> ScreenStateBuilder {
        ScreenStateBuilder::new()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Change the slot count. The open container is not touched; trigger a
    /// refresh to apply it.
    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the title, prepending the neutral colour marker. The open
    /// container is not touched; trigger a refresh to apply it.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(format!("{TITLE_RESET_PREFIX}{}", title.into()));
    }

    pub fn parent(&self) -> Option<&SharedScreen> {
        self.parent.as_ref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn return_element(&self) -> &Element {
        &self.return_element
    }

    pub fn viewer(&self) -> Option<ViewerId> {
        self.viewer
    }

    /// Explicitly rebind the viewer, the one sanctioned way to hand a screen
    /// instance to somebody else.
    pub fn set_viewer(&mut self, viewer: ViewerId) {
        self.viewer = Some(viewer);
    }

    /// Elements discovered by the last registration pass.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Estimated centre slot of the grid.
    #[deprecated(note = "inexact for uncommon sizes, kept as a best-effort legacy heuristic")]
    pub fn center_slot(&self) -> usize {
        let pos = self.size / 2;
        if [13, 22, 31].contains(&pos) {
            pos
        } else {
            pos.saturating_sub(5)
        }
    }

    pub(crate) fn bind_viewer(&mut self, viewer: ViewerId, screen_name: &str) -> Result<()> {
        match self.viewer {
            None => {
                self.viewer = Some(viewer);
                Ok(())
            }
            Some(bound) if bound == viewer => Ok(()),
            Some(bound) => Err(MenuError::ViewerRebound {
                screen: screen_name.to_string(),
                bound,
                requested: viewer,
            }),
        }
    }

    pub(crate) fn declared(&self) -> &[Declared] {
        &self.declared
    }

    pub(crate) fn replace_elements(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.registered
    }

    pub(crate) fn mark_registered(&mut self) {
        self.registered = true;
    }

    pub(crate) fn reset_registration(&mut self) {
        self.registered = false;
    }
}

/// Builder assembling a [`ScreenState`]; validation happens in
/// [`ScreenStateBuilder::build`] so misdeclared screens fail inside their own
/// constructor.
pub struct ScreenStateBuilder {
    size: usize,
    title: Option<String>,
    parent: Option<SharedScreen>,
    fresh_return: bool,
    declared: Vec<(Option<String>, Declared)>,
}

impl ScreenStateBuilder {
    fn new() -> Self {
        Self {
            size: 27,
            title: None,
            parent: None,
            fresh_return: false,
            declared: Vec::new(),
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(format!("{TITLE_RESET_PREFIX}{}", title.into()));
        self
    }

    /// Link the screen that opened this one; synthesizes the return element.
    pub fn parent(mut self, parent: SharedScreen) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Make the return element rebuild its target through
    /// [`Screen::new_instance`] instead of reusing the parent as-is.
    pub fn fresh_return(mut self, fresh: bool) -> Self {
        self.fresh_return = fresh;
        self
    }

    /// Declare a single element.
    pub fn element(mut self, element: Element) -> Self {
        self.declared.push((None, Declared::Single(element)));
        self
    }

    /// Declare a named, fixed group of elements. The group must be
    /// non-empty; the name only serves the error message.
    pub fn element_group(mut self, name: impl Into<String>, members: Vec<Element>) -> Self {
        self.declared.push((
            Some(name.into()),
            Declared::Group { members },
        ));
        self
    }

    pub fn build(self) -> Result<ScreenState> {
        if self.size == 0 || self.size % 9 != 0 {
            return Err(MenuError::InvalidSize(self.size));
        }

        let mut declared = Vec::with_capacity(self.declared.len());
        for (name, entry) in self.declared {
            if let Declared::Group { members } = &entry {
                if members.is_empty() {
                    return Err(MenuError::EmptyElementGroup(
                        name.unwrap_or_else(|| "unnamed".to_string()),
                    ));
                }
            }
            declared.push(entry);
        }

        let return_element = match &self.parent {
            Some(parent) => Element::return_back(parent.clone(), self.fresh_return),
            None => Element::empty(),
        };

        Ok(ScreenState {
            size: self.size,
            title: self.title,
            parent: self.parent,
            return_element,
            declared,
            elements: Vec::new(),
            registered: false,
            viewer: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Bare {
        state: ScreenState,
    }

    impl Screen for Bare {
        fn state(&self) -> &ScreenState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut ScreenState {
            &mut self.state
        }
    }

    #[test]
    fn builder_rejects_bad_size() {
        let err = ScreenState::builder()
            .size(10)
            .title("Odd")
            .build()
            .expect_err("10 is not a multiple of 9");
        assert!(matches!(err, MenuError::InvalidSize(10)));

        let err = ScreenState::builder().size(0).build().expect_err("zero");
        assert!(matches!(err, MenuError::InvalidSize(0)));
    }

    #[test]
    fn builder_rejects_empty_group() {
        let err = ScreenState::builder()
            .title("Shop")
            .element_group("filters", Vec::new())
            .build()
            .expect_err("empty group");
        match err {
            MenuError::EmptyElementGroup(name) => assert_eq!(name, "filters"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn title_gets_reset_prefix() {
        let state = ScreenState::builder().title("Shop").build().unwrap();
        assert_eq!(state.title(), Some("&0Shop"));

        let mut state = state;
        state.set_title("Sale");
        assert_eq!(state.title(), Some("&0Sale"));
    }

    #[test]
    fn viewer_binds_once() {
        let state = ScreenState::builder().title("Shop").build().unwrap();
        let mut state = state;
        state.bind_viewer(ViewerId(1), "shop").unwrap();
        state.bind_viewer(ViewerId(1), "shop").unwrap();

        let err = state
            .bind_viewer(ViewerId(2), "shop")
            .expect_err("silent rebinding");
        assert!(matches!(err, MenuError::ViewerRebound { .. }));

        state.set_viewer(ViewerId(2));
        assert_eq!(state.viewer(), Some(ViewerId(2)));
    }

    #[test]
    #[allow(deprecated)]
    fn center_slot_keeps_legacy_quirks() {
        let at = |size: usize| {
            ScreenState::builder()
                .size(size)
                .title("t")
                .build()
                .unwrap()
                .center_slot()
        };
        assert_eq!(at(27), 13);
        assert_eq!(at(45), 22);
        assert_eq!(at(63), 31);
        assert_eq!(at(54), 22);
        assert_eq!(at(9), 0);
    }

    #[test]
    fn return_element_follows_parent() {
        let parent = share(Bare {
            state: ScreenState::builder().title("Parent").build().unwrap(),
        });

        let no_parent = ScreenState::builder().title("Root").build().unwrap();
        assert!(no_parent.return_element().is_dummy());
        assert!(!no_parent.has_parent());

        let child = ScreenState::builder()
            .title("Child")
            .parent(parent)
            .build()
            .unwrap();
        assert!(!child.return_element().is_dummy());
        assert!(child.has_parent());
    }
}
