//! Error types for the chat client

use thiserror::Error;

/// Errors talking to the chat service or local stores
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network/HTTP error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but reported failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Missing or rejected bearer token
    #[error("Unauthorized: sign in again")]
    Unauthorized,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Token store error
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors turning a message into a downloadable artifact
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Output file carried neither inline content nor a URL
    #[error("Output file has no content")]
    MissingPayload,

    /// Paginated document synthesis is not compiled in
    #[error("Document synthesis unavailable")]
    SynthesisUnavailable,

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a send is refused before anything is dispatched
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    #[error("Nothing to send")]
    EmptyInput,

    #[error("A message is already being sent")]
    InFlight,
}

pub type Result<T> = std::result::Result<T, ClientError>;
