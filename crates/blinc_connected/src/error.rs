//! Connected animation error types

use thiserror::Error;

/// Errors raised while completing a connected animation
///
/// None of these reach the registration API. They are produced by list
/// controls, the frame budget and config parsing, and are turned into a
/// cancel of the affected animation by the coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectedError {
    /// The platform refused or failed to start the animation
    #[error("Connected animation failed to start: {0}")]
    StartFailed(String),

    /// The list item for a key was not realized after scrolling
    #[error("List item for '{key}' was not realized")]
    ItemNotRealized { key: String },

    /// The start attempt did not finish within its frame budget
    #[error("Start attempt exceeded its budget of {frames} frames")]
    BudgetExceeded { frames: u32 },

    /// The list control was dropped before the continuation ran
    #[error("List control was dropped before the animation could start")]
    ListDropped,

    /// Invalid coordinator configuration
    #[error("Invalid connected animation config: {0}")]
    Config(String),
}

/// Result type for connected animation operations
pub type Result<T> = std::result::Result<T, ConnectedError>;
