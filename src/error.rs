//! Error types for the AFP library.
//!
//! This module defines all error types that can occur during document
//! assembly and structured-field serialization.

/// Result type alias for AFP library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while producing an AFP data stream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document assembly state machine was driven out of order
    /// (e.g. ending a document twice, emitting content with no open page).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A font resource cannot be embedded
    #[error("Unsupported font resource: {0}")]
    UnsupportedFont(String),

    /// A resource object carries a type byte the writer does not know
    #[error("Unknown resource object type: 0x{0:02X}")]
    UnknownResourceType(u8),

    /// A named resource could not be located in an external resource file
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Invalid output configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration deserialization error
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
