//! In-memory host implementations.
//!
//! A complete host double: manual-advance scheduler, recording surface,
//! viewer gateway, sound player, event bridge and attribute store. The unit
//! tests and the bench harness run entirely against these, and embedders can
//! use them to exercise screens without a real host attached.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{MenuError, Result};
use crate::visual::VisualItem;

use super::core::{
    AttrValue, AttributeStore, ContainerId, ContainerInfo, ContainerKind, EventBridge, HostBundle,
    OpenNotification, RenderSurface, ScheduledTask, SoundPlayer, SoundSpec, TickScheduler,
    ViewerGateway, ViewerId,
};

struct OpenContainer {
    id: ContainerId,
    kind: ContainerKind,
    size: usize,
    title: String,
    slots: Vec<Option<VisualItem>>,
    redraws: u64,
}

#[derive(Default)]
struct SurfaceState {
    next_id: u64,
    open: HashMap<ViewerId, OpenContainer>,
}

/// Rendering surface that keeps every open container in memory.
#[derive(Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item currently held by a slot of the viewer's open container.
    pub fn slot(&self, viewer: ViewerId, slot: usize) -> Option<VisualItem> {
        let state = self.state.lock().expect("surface mutex poisoned");
        state
            .open
            .get(&viewer)
            .and_then(|container| container.slots.get(slot))
            .and_then(|entry| entry.clone())
    }

    /// Displayed title of the viewer's open container.
    pub fn title(&self, viewer: ViewerId) -> Option<String> {
        let state = self.state.lock().expect("surface mutex poisoned");
        state.open.get(&viewer).map(|c| c.title.clone())
    }

    pub fn redraws(&self, viewer: ViewerId) -> u64 {
        let state = self.state.lock().expect("surface mutex poisoned");
        state.open.get(&viewer).map(|c| c.redraws).unwrap_or(0)
    }

    /// Simulate the viewer closing their container out of band.
    pub fn close(&self, viewer: ViewerId) {
        let mut state = self.state.lock().expect("surface mutex poisoned");
        state.open.remove(&viewer);
    }

    /// Simulate the viewer opening a non-grid container out of band.
    pub fn open_foreign(&self, viewer: ViewerId, size: usize) {
        let mut state = self.state.lock().expect("surface mutex poisoned");
        state.next_id += 1;
        let id = ContainerId(state.next_id);
        state.open.insert(
            viewer,
            OpenContainer {
                id,
                kind: ContainerKind::Other,
                size,
                title: String::new(),
                slots: vec![None; size],
                redraws: 0,
            },
        );
    }
}

impl RenderSurface for MemorySurface {
    fn open_container(&self, viewer: ViewerId, size: usize, title: &str) -> Result<ContainerId> {
        let mut state = self.state.lock().expect("surface mutex poisoned");
        state.next_id += 1;
        let id = ContainerId(state.next_id);
        state.open.insert(
            viewer,
            OpenContainer {
                id,
                kind: ContainerKind::Grid,
                size,
                title: title.to_string(),
                slots: vec![None; size],
                redraws: 0,
            },
        );
        Ok(id)
    }

    fn set_slot(
        &self,
        container: ContainerId,
        slot: usize,
        item: Option<VisualItem>,
    ) -> Result<()> {
        let mut state = self.state.lock().expect("surface mutex poisoned");
        let open = state
            .open
            .values_mut()
            .find(|c| c.id == container)
            .ok_or_else(|| MenuError::StateMismatch(format!("{container:?} is not open")))?;
        if slot >= open.size {
            return Err(MenuError::SlotOutOfRange {
                slot,
                size: open.size,
            });
        }
        open.slots[slot] = item;
        Ok(())
    }

    fn open_container_info(&self, viewer: ViewerId) -> Option<ContainerInfo> {
        let state = self.state.lock().expect("surface mutex poisoned");
        state.open.get(&viewer).map(|c| ContainerInfo {
            id: c.id,
            kind: c.kind,
            size: c.size,
        })
    }

    fn force_redraw(&self, viewer: ViewerId) -> Result<()> {
        let mut state = self.state.lock().expect("surface mutex poisoned");
        let open = state
            .open
            .get_mut(&viewer)
            .ok_or_else(|| MenuError::StateMismatch(format!("{viewer} has nothing open")))?;
        open.redraws += 1;
        Ok(())
    }

    fn set_title(&self, viewer: ViewerId, title: &str) -> Result<()> {
        let mut state = self.state.lock().expect("surface mutex poisoned");
        let open = state
            .open
            .get_mut(&viewer)
            .ok_or_else(|| MenuError::StateMismatch(format!("{viewer} has nothing open")))?;
        open.title = title.to_string();
        Ok(())
    }
}

/// Viewer gateway tracking conversation state and delivered messages.
#[derive(Default)]
pub struct MemoryViewers {
    conversing: Mutex<HashSet<ViewerId>>,
    messages: Mutex<Vec<(ViewerId, String)>>,
}

impl MemoryViewers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_conversing(&self, viewer: ViewerId, conversing: bool) {
        let mut set = self.conversing.lock().expect("viewer mutex poisoned");
        if conversing {
            set.insert(viewer);
        } else {
            set.remove(&viewer);
        }
    }

    pub fn messages(&self) -> Vec<(ViewerId, String)> {
        self.messages.lock().expect("viewer mutex poisoned").clone()
    }
}

impl ViewerGateway for MemoryViewers {
    fn is_conversing(&self, viewer: ViewerId) -> bool {
        self.conversing
            .lock()
            .expect("viewer mutex poisoned")
            .contains(&viewer)
    }

    fn send_message(&self, viewer: ViewerId, message: &str) {
        self.messages
            .lock()
            .expect("viewer mutex poisoned")
            .push((viewer, message.to_string()));
    }
}

/// Event bridge that counts notifications and can cancel every open.
#[derive(Default)]
pub struct RecordingEventBridge {
    cancel_all: AtomicBool,
    opens: AtomicU64,
}

impl RecordingEventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cancel(&self, cancel: bool) {
        self.cancel_all.store(cancel, Ordering::SeqCst);
    }

    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl EventBridge for RecordingEventBridge {
    fn notify_open(&self, notification: &mut OpenNotification<'_>) {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.cancel_all.load(Ordering::SeqCst) {
            notification.cancel();
        }
    }
}

#[derive(Default)]
struct SchedulerState {
    now: u64,
    queue: Vec<(u64, ScheduledTask)>,
}

/// Tick scheduler advanced by hand, preserving submission order within a
/// tick. Tasks scheduled by a running task land in the same pass when their
/// delay is zero.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<SchedulerState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.state.lock().expect("scheduler mutex poisoned").queue.len()
    }

    pub fn now(&self) -> u64 {
        self.state.lock().expect("scheduler mutex poisoned").now
    }

    /// Step the clock forward, running every task that comes due.
    ///
    /// The first task error aborts the pass; tasks not yet run stay queued.
    pub fn advance(&self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            {
                let mut state = self.state.lock().expect("scheduler mutex poisoned");
                state.now += 1;
            }
            loop {
                let due = {
                    let mut state = self.state.lock().expect("scheduler mutex poisoned");
                    let now = state.now;
                    let mut rest = Vec::new();
                    let mut due = Vec::new();
                    for (at, task) in state.queue.drain(..) {
                        if at <= now {
                            due.push(task);
                        } else {
                            rest.push((at, task));
                        }
                    }
                    state.queue = rest;
                    due
                };
                if due.is_empty() {
                    break;
                }
                for task in due {
                    task()?;
                }
            }
        }
        Ok(())
    }
}

impl TickScheduler for ManualScheduler {
    fn run_after(&self, ticks: u64, work: ScheduledTask) {
        let mut state = self.state.lock().expect("scheduler mutex poisoned");
        let at = state.now + ticks;
        state.queue.push((at, work));
    }
}

/// Sound player that records every playback.
#[derive(Default)]
pub struct RecordingSoundPlayer {
    played: Mutex<Vec<(ViewerId, String)>>,
}

impl RecordingSoundPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<(ViewerId, String)> {
        self.played.lock().expect("sound mutex poisoned").clone()
    }
}

impl SoundPlayer for RecordingSoundPlayer {
    fn play(&self, viewer: ViewerId, sound: &SoundSpec) {
        self.played
            .lock()
            .expect("sound mutex poisoned")
            .push((viewer, sound.key.clone()));
    }
}

/// Attribute store backed by a hash map.
#[derive(Default)]
pub struct MemoryAttributeStore {
    inner: RwLock<HashMap<(ViewerId, String), AttrValue>>,
}

impl MemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeStore for MemoryAttributeStore {
    fn get(&self, viewer: ViewerId, key: &str) -> Option<AttrValue> {
        let guard = self.inner.read().expect("store lock poisoned");
        guard.get(&(viewer, key.to_string())).cloned()
    }

    fn set(&self, viewer: ViewerId, key: &str, value: AttrValue) {
        let mut guard = self.inner.write().expect("store lock poisoned");
        guard.insert((viewer, key.to_string()), value);
    }
}

/// Typed handles to a full in-memory host plus the bundle the runtime wants.
pub struct MemoryHost {
    pub surface: Arc<MemorySurface>,
    pub viewers: Arc<MemoryViewers>,
    pub events: Arc<RecordingEventBridge>,
    pub scheduler: Arc<ManualScheduler>,
    pub sounds: Arc<RecordingSoundPlayer>,
    pub store: Arc<MemoryAttributeStore>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            surface: Arc::new(MemorySurface::new()),
            viewers: Arc::new(MemoryViewers::new()),
            events: Arc::new(RecordingEventBridge::new()),
            scheduler: Arc::new(ManualScheduler::new()),
            sounds: Arc::new(RecordingSoundPlayer::new()),
            store: Arc::new(MemoryAttributeStore::new()),
        }
    }

    pub fn bundle(&self) -> HostBundle {
        HostBundle {
            surface: self.surface.clone(),
            viewers: self.viewers.clone(),
            events: self.events.clone(),
            scheduler: self.scheduler.clone(),
            sounds: self.sounds.clone(),
            store: self.store.clone(),
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_runs_tasks_in_submission_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = order.clone();
            scheduler.run_after(
                1,
                Box::new(move || {
                    order.lock().unwrap().push(tag);
                    Ok(())
                }),
            );
        }

        scheduler.advance(1).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn scheduler_defers_until_due() {
        let scheduler = ManualScheduler::new();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        scheduler.run_after(
            3,
            Box::new(move || {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
        );

        scheduler.advance(2).unwrap();
        assert!(!ran.load(Ordering::SeqCst));
        scheduler.advance(1).unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn surface_rejects_unknown_container() {
        let surface = MemorySurface::new();
        let err = surface
            .set_slot(ContainerId(99), 0, None)
            .expect_err("unknown container");
        assert!(matches!(err, MenuError::StateMismatch(_)));
    }

    #[test]
    fn surface_tracks_slots_and_title() {
        let surface = MemorySurface::new();
        let viewer = ViewerId(7);
        let container = surface.open_container(viewer, 9, "&0Shop").unwrap();
        let item = VisualItem::new("Sword");
        surface.set_slot(container, 4, Some(item.clone())).unwrap();

        assert_eq!(surface.slot(viewer, 4), Some(item));
        assert_eq!(surface.title(viewer), Some("&0Shop".to_string()));
        let info = surface.open_container_info(viewer).unwrap();
        assert_eq!(info.size, 9);
        assert_eq!(info.kind, ContainerKind::Grid);
    }

    #[test]
    fn store_round_trips_values() {
        let store = MemoryAttributeStore::new();
        let viewer = ViewerId(1);
        store.set(viewer, "menu.current", Arc::new(42u32));
        let value = store.get(viewer, "menu.current").unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));
        assert!(store.get(viewer, "menu.previous").is_none());
    }
}
