//! Slot-grid menu session framework.
//!
//! Screens are paginated containers of fixed-size clickable slots. The crate
//! tracks per-viewer navigation state (current and previous screen), builds a
//! render buffer per display pass, commits it to the host surface one
//! scheduling quantum later, and routes incoming click notifications to the
//! right element handler. Everything host-specific — rendering, events,
//! scheduling, sounds, attribute storage — stays behind the traits in
//! [`host`], with a complete in-memory host for tests and demos.

pub mod buffer;
pub mod element;
pub mod error;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod screen;
pub mod visual;

pub use buffer::RenderBuffer;
pub use element::{ClickArea, Element, ElementHandler};
pub use error::{MenuError, Result};
pub use host::memory::{
    ManualScheduler, MemoryAttributeStore, MemoryHost, MemorySurface, MemoryViewers,
    RecordingEventBridge, RecordingSoundPlayer,
};
pub use host::{
    AttrValue, AttributeStore, ClickEvent, ClickKind, ContainerId, ContainerInfo, ContainerKind,
    EventBridge, HostBundle, NullEventBridge, OpenNotification, RenderSurface, ScheduledTask,
    SlotAction, SoundPlayer, SoundSpec, TickScheduler, ViewerGateway, ViewerId,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MenuMetrics, MetricSnapshot};
pub use runtime::session::SessionRegistry;
pub use runtime::{ClickContext, DisplayOutcome, MenuConfig, MenuRuntime};
pub use screen::{Screen, ScreenState, ScreenStateBuilder, SharedScreen, TITLE_RESET_PREFIX, share};
pub use visual::VisualItem;
