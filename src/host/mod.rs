//! Host module orchestrator.
//!
//! The core talks to its host exclusively through the traits defined here:
//! the rendering surface, the viewer gateway, the open-notification bridge,
//! the tick scheduler, the sound subsystem and the per-viewer attribute
//! store. `memory` ships complete in-memory implementations used by the unit
//! tests and the bench harness.

mod core;
pub mod memory;

pub use core::{
    AttrValue, AttributeStore, ClickEvent, ClickKind, ContainerId, ContainerInfo, ContainerKind,
    EventBridge, HostBundle, NullEventBridge, OpenNotification, RenderSurface, ScheduledTask,
    SlotAction, SoundPlayer, SoundSpec, TickScheduler, ViewerGateway, ViewerId,
};
