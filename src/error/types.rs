use thiserror::Error;

use crate::host::ViewerId;

/// Unified result type for the menu framework.
pub type Result<T> = std::result::Result<T, MenuError>;

/// Errors surfaced by screens, the session registry and the runtime.
///
/// Soft aborts (cancelled open notification, viewer mid-conversation) are not
/// errors; they are reported through `DisplayOutcome`.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("menu title not set")]
    TitleNotSet,
    #[error("menu size {0} is not a positive multiple of 9")]
    InvalidSize(usize),
    #[error("element group `{0}` is empty")]
    EmptyElementGroup(String),
    #[error("no viewer bound to `{0}`")]
    ViewerNotBound(String),
    #[error("`{screen}` already belongs to {bound}, refusing to rebind to {requested}")]
    ViewerRebound {
        screen: String,
        bound: ViewerId,
        requested: ViewerId,
    },
    #[error("`{0}` cannot create fresh instances, override `new_instance`")]
    NewInstanceUnsupported(String),
    #[error("container state mismatch: {0}")]
    StateMismatch(String),
    #[error("slot {slot} out of range for size {size}")]
    SlotOutOfRange { slot: usize, size: usize },
    #[error("session record for {viewer} under `{key}` is missing or foreign")]
    SessionDesync { viewer: ViewerId, key: String },
    #[error("screen lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
