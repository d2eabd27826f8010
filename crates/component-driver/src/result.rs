//! Result and error types for component drivers.

use thiserror::Error;

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors that can occur while driving a component
#[derive(Debug, Error)]
pub enum DriverError {
    /// `render` was called on a driver that already rendered
    #[error("Driver already rendered: construct a new driver to render again")]
    AlreadyRendered,

    /// A query or update needs a mounted tree and there is none
    #[error("Cannot {operation}: nothing is mounted (render first or pass an existing handle)")]
    NotMounted {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// `render` was called on a sub-driver scoped to a borrowed tree
    #[error("Cannot render through a sub-driver: it only queries an existing tree")]
    ScopedRender,

    /// An API mock was built without its required parts
    #[error("Invalid API mock: {message}")]
    InvalidApiMock {
        /// Error message
        message: String,
    },

    /// The renderer failed to mount
    #[error("Mount failed: {message}")]
    Mount {
        /// Error message
        message: String,
    },

    /// The renderer failed to tear a tree down
    #[error("Teardown failed: {message}")]
    Teardown {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
