//! Element module orchestrator.
//!
//! Clickable units occupying menu slots; implementation in the private
//! `core` module.

mod core;

pub use core::{ClickArea, Element, ElementHandler};
