//! Crate-wide error type
//!
//! Every fallible operation returns [`SceneError`]. Construction-time
//! failures (missing asset id, unresolvable template, unsupported component
//! value) surface before render; serving failures surface when the server
//! starts. Nothing in the crate retries.

use std::fmt;

/// Error type for scene building, rendering, persistence, and serving
#[derive(Debug)]
pub enum SceneError {
    /// File or socket I/O error
    Io(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// A non-inline asset was configured without an `id`
    MissingAssetId(String),
    /// The template name is neither a built-in nor a path to an existing file
    UnknownTemplate(String),
    /// A component configuration value has an unsupported shape
    BadComponentValue {
        /// Name of the offending component
        component: String,
        /// What was wrong with the supplied value
        detail: String,
    },
    /// `serve` was called while this scene already has an active server
    AlreadyServing(String),
    /// The HTTP server could not be started
    ServerStart(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Io(msg) => write!(f, "I/O error: {}", msg),
            SceneError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SceneError::MissingAssetId(src) => {
                write!(f, "Non-inline asset '{}' requires an id", src)
            }
            SceneError::UnknownTemplate(name) => {
                write!(f, "Unknown template '{}': not a built-in and not an existing file", name)
            }
            SceneError::BadComponentValue { component, detail } => {
                write!(f, "Unsupported value for component '{}': {}", component, detail)
            }
            SceneError::AlreadyServing(addr) => {
                write!(f, "Scene is already being served at {}; call stop() first", addr)
            }
            SceneError::ServerStart(msg) => write!(f, "Failed to start server: {}", msg),
        }
    }
}

impl std::error::Error for SceneError {}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::Io(e.to_string())
    }
}
