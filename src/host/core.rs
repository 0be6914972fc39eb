use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::buffer::RenderBuffer;
use crate::error::Result;
use crate::visual::VisualItem;

/// Identity of a viewer, as assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerId(pub u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// Handle to a container the host has opened for a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

/// Shape of an open container as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A paginated slot grid, the only kind the core can refresh into.
    Grid,
    /// Anything else the viewer may have opened out of band.
    Other,
}

/// Metadata for a viewer's currently open container.
#[derive(Debug, Clone, Copy)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub kind: ContainerKind,
    pub size: usize,
}

/// Host classification of the click gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Left,
    Right,
    Middle,
    ShiftLeft,
    ShiftRight,
    Double,
    Drop,
    Number(u8),
    Unknown,
}

/// Host classification of what the click would do to slot contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    Pickup,
    Place,
    Swap,
    Drop,
    MoveToOther,
    Nothing,
    Unknown,
}

/// A sound the host can play to a viewer.
#[derive(Debug, Clone)]
pub struct SoundSpec {
    pub key: String,
    pub volume: f32,
    pub pitch: f32,
    pub random_pitch: bool,
}

impl SoundSpec {
    pub fn new(key: impl Into<String>, volume: f32, pitch: f32, random_pitch: bool) -> Self {
        Self {
            key: key.into(),
            volume,
            pitch,
            random_pitch,
        }
    }
}

/// Rendering surface of the host.
///
/// `set_title` exists for the timed title flash during a live refresh; hosts
/// without title mutation can treat it as a no-op.
pub trait RenderSurface: Send + Sync {
    /// Open a fresh grid container of `size` slots for the viewer.
    fn open_container(&self, viewer: ViewerId, size: usize, title: &str) -> Result<ContainerId>;

    /// Put `item` into a slot of an open container; `None` clears the slot.
    fn set_slot(
        &self,
        container: ContainerId,
        slot: usize,
        item: Option<VisualItem>,
    ) -> Result<()>;

    /// Inspect the viewer's currently open container, if any.
    fn open_container_info(&self, viewer: ViewerId) -> Option<ContainerInfo>;

    /// Force the host to repaint the viewer's open container.
    fn force_redraw(&self, viewer: ViewerId) -> Result<()>;

    /// Swap the displayed title of the viewer's open container.
    fn set_title(&self, viewer: ViewerId, title: &str) -> Result<()>;
}

/// Viewer-facing side channels: conversation state and plain messages.
pub trait ViewerGateway: Send + Sync {
    /// Whether the viewer is captured by a blocking conversation prompt.
    fn is_conversing(&self, viewer: ViewerId) -> bool;

    /// Deliver a plain text message to the viewer.
    fn send_message(&self, viewer: ViewerId, message: &str);
}

/// Cancellable notification published just before a screen opens.
///
/// Listeners get mutable access to the staged buffer, mirroring the original
/// open event which exposed the drawn inventory.
pub struct OpenNotification<'a> {
    viewer: ViewerId,
    buffer: &'a mut RenderBuffer,
    cancelled: bool,
}

impl<'a> OpenNotification<'a> {
    pub(crate) fn new(viewer: ViewerId, buffer: &'a mut RenderBuffer) -> Self {
        Self {
            viewer,
            buffer,
            cancelled: false,
        }
    }

    pub fn viewer(&self) -> ViewerId {
        self.viewer
    }

    pub fn buffer(&self) -> &RenderBuffer {
        self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut RenderBuffer {
        self.buffer
    }

    /// Abort the display pass; no session update and no commit will happen.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Outbound side of the host event source.
pub trait EventBridge: Send + Sync {
    /// Publish the about-to-open notification to host listeners.
    fn notify_open(&self, notification: &mut OpenNotification<'_>);
}

/// Bridge used when no listeners are attached.
#[derive(Debug, Default)]
pub struct NullEventBridge;

impl EventBridge for NullEventBridge {
    fn notify_open(&self, _notification: &mut OpenNotification<'_>) {}
}

/// Click notification delivered by the host event source.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub viewer: ViewerId,
    pub slot: usize,
    pub action: SlotAction,
    pub click: ClickKind,
    pub cursor: Option<VisualItem>,
    pub clicked: Option<VisualItem>,
    /// Whether the host already marked the underlying event cancelled.
    pub host_cancelled: bool,
}

/// Deferred unit of work handed to the host scheduler.
pub type ScheduledTask = Box<dyn FnOnce() -> Result<()> + Send>;

/// The host's discrete time-stepped scheduler.
pub trait TickScheduler: Send + Sync {
    /// Run `work` after `ticks` scheduling quanta have elapsed.
    fn run_after(&self, ticks: u64, work: ScheduledTask);
}

/// Sound subsystem of the host.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, viewer: ViewerId, sound: &SoundSpec);
}

/// Type-erased value kept in the per-viewer attribute store.
pub type AttrValue = Arc<dyn Any + Send + Sync>;

/// Per-viewer keyed attribute store the host remembers session state in.
pub trait AttributeStore: Send + Sync {
    fn get(&self, viewer: ViewerId, key: &str) -> Option<AttrValue>;

    fn set(&self, viewer: ViewerId, key: &str, value: AttrValue);
}

/// Bundle of every collaborator the runtime needs from its host.
#[derive(Clone)]
pub struct HostBundle {
    pub surface: Arc<dyn RenderSurface>,
    pub viewers: Arc<dyn ViewerGateway>,
    pub events: Arc<dyn EventBridge>,
    pub scheduler: Arc<dyn TickScheduler>,
    pub sounds: Arc<dyn SoundPlayer>,
    pub store: Arc<dyn AttributeStore>,
}
