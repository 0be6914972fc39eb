use std::fmt;
use std::sync::Arc;

/// Opaque handle to whatever the host renders inside one slot.
///
/// The core never interprets the payload; it only compares handles. Equality
/// is identity: clones of one item compare equal, two separately constructed
/// items never do, even with the same label. This keeps click matching exact
/// when several slots carry visually identical content.
#[derive(Clone)]
pub struct VisualItem {
    inner: Arc<VisualData>,
}

struct VisualData {
    label: String,
    detail: Vec<String>,
}

impl VisualItem {
    /// Create a new item with a label and no detail lines.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_detail(label, Vec::new())
    }

    /// Create a new item with a label and detail lines shown by the host.
    pub fn with_detail(label: impl Into<String>, detail: Vec<String>) -> Self {
        Self {
            inner: Arc::new(VisualData {
                label: label.into(),
                detail,
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn detail(&self) -> &[String] {
        &self.inner.detail
    }
}

impl PartialEq for VisualItem {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for VisualItem {}

impl fmt::Debug for VisualItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualItem({:?})", self.inner.label)
    }
}
