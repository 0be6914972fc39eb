//! Per-viewer session records.
//!
//! The registry remembers which screen a viewer currently has open and which
//! one they came from, backed by the host's attribute store under
//! namespace-scoped keys. Entries are overwritten on navigation and never
//! deleted, matching the host metadata the original design leaned on.

use std::sync::Arc;

use crate::error::{MenuError, Result};
use crate::host::{AttributeStore, ViewerId};
use crate::screen::SharedScreen;

/// Viewer-to-screen record store.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn AttributeStore>,
    current_key: String,
    previous_key: String,
}

impl SessionRegistry {
    /// Build a registry over the host store. The namespace scopes the keys
    /// so several embedders can share one attribute store.
    pub fn new(store: Arc<dyn AttributeStore>, namespace: &str) -> Self {
        Self {
            store,
            current_key: format!("{namespace}.current"),
            previous_key: format!("{namespace}.previous"),
        }
    }

    /// Screen the viewer currently has open, if any.
    pub fn current(&self, viewer: ViewerId) -> Result<Option<SharedScreen>> {
        self.lookup(viewer, &self.current_key)
    }

    /// Screen the viewer navigated away from, if any.
    pub fn previous(&self, viewer: ViewerId) -> Result<Option<SharedScreen>> {
        self.lookup(viewer, &self.previous_key)
    }

    /// Record the screen the viewer now has open. Invoked only by the
    /// deferred commit of a display pass.
    pub fn record_current(&self, viewer: ViewerId, screen: &SharedScreen) -> Result<()> {
        self.record(viewer, &self.current_key, screen)
    }

    /// Record the screen the viewer is leaving. Invoked only by the display
    /// pass, right before the commit is scheduled.
    pub fn record_previous(&self, viewer: ViewerId, screen: &SharedScreen) -> Result<()> {
        self.record(viewer, &self.previous_key, screen)
    }

    fn lookup(&self, viewer: ViewerId, key: &str) -> Result<Option<SharedScreen>> {
        match self.store.get(viewer, key) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<SharedScreen>()
                .cloned()
                .map(Some)
                .ok_or_else(|| MenuError::SessionDesync {
                    viewer,
                    key: key.to_string(),
                }),
        }
    }

    // Write-then-read-back guards against stores that drop or mangle values.
    fn record(&self, viewer: ViewerId, key: &str, screen: &SharedScreen) -> Result<()> {
        self.store
            .set(viewer, key, Arc::new(Arc::clone(screen)));

        let stored = self.lookup(viewer, key)?;
        match stored {
            Some(stored) if Arc::ptr_eq(&stored, screen) => Ok(()),
            _ => Err(MenuError::SessionDesync {
                viewer,
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::AttrValue;
    use crate::host::memory::MemoryAttributeStore;
    use crate::screen::{Screen, ScreenState, share};

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

    fn bare(title: &str) -> SharedScreen {
        share(Bare {
            state: ScreenState::builder().title(title).build().unwrap(),
        })
    }

    #[test]
    fn records_and_looks_up_by_identity() {
        let registry = SessionRegistry::new(Arc::new(MemoryAttributeStore::new()), "menu");
        let viewer = ViewerId(1);
        let first = bare("First");
        let second = bare("Second");

        assert!(registry.current(viewer).unwrap().is_none());

        registry.record_current(viewer, &first).unwrap();
        registry.record_previous(viewer, &first).unwrap();
        registry.record_current(viewer, &second).unwrap();

        let current = registry.current(viewer).unwrap().unwrap();
        let previous = registry.previous(viewer).unwrap().unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(Arc::ptr_eq(&previous, &first));
    }

    #[test]
    fn lossy_store_is_a_desync() {
        struct LossyStore;

        impl AttributeStore for LossyStore {
            fn get(&self, _viewer: ViewerId, _key: &str) -> Option<AttrValue> {
                None
            }

            fn set(&self, _viewer: ViewerId, _key: &str, _value: AttrValue) {}
        }

        let registry = SessionRegistry::new(Arc::new(LossyStore), "menu");
        let err = registry
            .record_current(ViewerId(1), &bare("Shop"))
            .expect_err("store dropped the record");
        assert!(matches!(err, MenuError::SessionDesync { .. }));
    }

    #[test]
    fn foreign_record_is_a_desync() {
        let store = Arc::new(MemoryAttributeStore::new());
        let registry = SessionRegistry::new(store.clone(), "menu");
        let viewer = ViewerId(2);

        store.set(viewer, "menu.current", Arc::new("not a screen"));

        let err = registry.current(viewer).expect_err("foreign value");
        assert!(matches!(err, MenuError::SessionDesync { .. }));
    }

    #[test]
    fn namespaces_do_not_collide() {
        let store = Arc::new(MemoryAttributeStore::new());
        let shop = SessionRegistry::new(store.clone(), "shop");
        let bank = SessionRegistry::new(store, "bank");
        let viewer = ViewerId(3);
        let screen = bare("Shop");

        shop.record_current(viewer, &screen).unwrap();
        assert!(bank.current(viewer).unwrap().is_none());
    }
}
