use std::fmt;
use std::sync::Arc;

use crate::error::{MenuError, Result};
use crate::host::{ClickKind, ViewerId};
use crate::runtime::ClickContext;
use crate::screen::SharedScreen;
use crate::visual::VisualItem;

/// Where a click landed relative to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickArea {
    /// Inside the menu grid itself.
    Menu,
    /// Inside the viewer's own slot grid below the menu.
    ViewerGrid,
    /// Outside any container.
    Outside,
}

/// Handler invoked when a registered element is clicked.
///
/// Handlers queue follow-up work (navigation, refresh) on the context rather
/// than acting on the screen directly; the runtime applies the queued outcome
/// once the screen lock is released.
pub type ElementHandler = Arc<dyn Fn(&mut ClickContext, ViewerId, ClickKind) -> Result<()> + Send + Sync>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Active,
    Dummy,
}

/// A clickable unit bound to a visual item.
///
/// Cheap to clone; the handler sits behind an `Arc`. The dummy variant keeps
/// its visual but swallows clicks.
#[derive(Clone)]
pub struct Element {
    visual: VisualItem,
    handler: ElementHandler,
    kind: ElementKind,
}

impl Element {
    /// Create an active element with a click handler.
    pub fn new(visual: VisualItem, handler: ElementHandler) -> Self {
        Self {
            visual,
            handler,
            kind: ElementKind::Active,
        }
    }

    /// Create the no-op variant keeping the given visual.
    pub fn dummy(visual: VisualItem) -> Self {
        Self {
            visual,
            handler: Arc::new(|_, _, _| Ok(())),
            kind: ElementKind::Dummy,
        }
    }

    /// Dummy element with a blank visual, used where no real element exists.
    pub fn empty() -> Self {
        Self::dummy(VisualItem::new(""))
    }

    /// Dummy info element whose visual carries the menu description.
    pub fn info(lines: Vec<String>) -> Self {
        Self::dummy(VisualItem::with_detail("Menu Information", lines))
    }

    /// Element that navigates back to the parent screen when clicked.
    ///
    /// With `fresh_instance` the parent is asked for a new instance instead
    /// of being re-displayed as-is.
    pub fn return_back(parent: SharedScreen, fresh_instance: bool) -> Self {
        let visual = VisualItem::with_detail(
            "Return",
            vec!["Back to the previous screen".to_string()],
        );
        let handler: ElementHandler = Arc::new(move |ctx, _viewer, _click| {
            let target = if fresh_instance {
                let guard = parent.lock().map_err(|_| MenuError::Poisoned)?;
                guard.new_instance()?
            } else {
                parent.clone()
            };
            ctx.navigate(target);
            Ok(())
        });
        Self::new(visual, handler)
    }

    pub fn visual(&self) -> &VisualItem {
        &self.visual
    }

    /// Whether this is the no-op variant.
    pub fn is_dummy(&self) -> bool {
        self.kind == ElementKind::Dummy
    }

    /// Invoke the click handler.
    pub fn click(&self, ctx: &mut ClickContext, viewer: ViewerId, click: ClickKind) -> Result<()> {
        (self.handler)(ctx, viewer, click)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dummy() { "dummy" } else { "active" };
        write!(f, "Element({kind}, {:?})", self.visual)
    }
}
