use std::collections::BTreeMap;

use crate::error::{MenuError, Result};
use crate::host::{ContainerId, RenderSurface, ViewerId};
use crate::visual::VisualItem;

/// Slot-to-item staging model built fresh for every render pass.
///
/// The buffer never outlives its pass: `display_to` moves it into the
/// deferred commit, a live refresh writes straight to the surface instead.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    size: usize,
    title: String,
    slots: BTreeMap<usize, VisualItem>,
}

impl RenderBuffer {
    pub fn new(size: usize, title: impl Into<String>) -> Self {
        Self {
            size,
            title: title.into(),
            slots: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Stage an item for a slot, replacing whatever was there.
    pub fn set_item(&mut self, slot: usize, item: VisualItem) -> Result<()> {
        if slot >= self.size {
            return Err(MenuError::SlotOutOfRange {
                slot,
                size: self.size,
            });
        }
        self.slots.insert(slot, item);
        Ok(())
    }

    /// Whether a slot already holds staged content.
    pub fn is_set(&self, slot: usize) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn item_at(&self, slot: usize) -> Option<&VisualItem> {
        self.slots.get(&slot)
    }

    /// Iterate staged slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &VisualItem)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    /// Open a fresh container on the surface and push every staged slot.
    pub fn commit(&self, surface: &dyn RenderSurface, viewer: ViewerId) -> Result<ContainerId> {
        let container = surface.open_container(viewer, self.size, &self.title)?;
        for (slot, item) in self.slots() {
            surface.set_slot(container, slot, Some(item.clone()))?;
        }
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySurface;

    #[test]
    fn set_and_query() {
        let mut buffer = RenderBuffer::new(27, "&0Shop");
        let item = VisualItem::new("Sword");
        buffer.set_item(10, item.clone()).unwrap();

        assert!(buffer.is_set(10));
        assert!(!buffer.is_set(11));
        assert_eq!(buffer.item_at(10), Some(&item));
    }

    #[test]
    fn rejects_out_of_range_slot() {
        let mut buffer = RenderBuffer::new(9, "&0Tiny");
        let err = buffer
            .set_item(9, VisualItem::new("Late"))
            .expect_err("slot past the end");
        assert!(matches!(err, MenuError::SlotOutOfRange { slot: 9, size: 9 }));
    }

    #[test]
    fn commit_opens_and_fills() {
        let surface = MemorySurface::new();
        let viewer = ViewerId(5);
        let mut buffer = RenderBuffer::new(9, "&0Shop");
        let item = VisualItem::new("Sword");
        buffer.set_item(4, item.clone()).unwrap();

        buffer.commit(&surface, viewer).unwrap();

        assert_eq!(surface.slot(viewer, 4), Some(item));
        assert_eq!(surface.title(viewer), Some("&0Shop".to_string()));
    }
}
