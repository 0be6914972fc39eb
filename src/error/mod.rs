//! Error module orchestrator.
//!
//! Public error types live in the private `types` module and are re-exported
//! from here so downstream code can import them from one place.

mod types;

pub use types::{MenuError, Result};
