//! Error types for the vss-core library.

use thiserror::Error;

/// Main error type for the vss library.
#[derive(Error, Debug)]
pub enum VssError {
    /// Pattern registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while building or querying the pattern registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No spec is registered under this field name.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A spec is already registered and overwrite was not requested.
    #[error("field already registered: {0}")]
    DuplicateField(String),

    /// A selector, regex or path expression failed to compile.
    #[error("invalid pattern for {field} ({pattern}): {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },
}

/// Errors related to field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The document bytes are not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    /// A strategy failed while inspecting the document.
    #[error("{strategy} strategy failed for {field}: {reason}")]
    Strategy {
        strategy: String,
        field: String,
        reason: String,
    },

    /// A normalizer could not be built from the lookup tables.
    #[error("failed to build normalizer {name}: {reason}")]
    Normalizer { name: String, reason: String },
}

/// Result type for the vss library.
pub type Result<T> = std::result::Result<T, VssError>;
