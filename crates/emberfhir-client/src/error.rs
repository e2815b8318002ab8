use thiserror::Error;

use emberfhir_core::CoreError;
use emberfhir_transfer::TransferError;

/// Errors from talking to a FHIR server over HTTP.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid API address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    /// Transport-level failure: connect, timeout, TLS, body read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status, with OperationOutcome diagnostics when the
    /// server provided them.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server's response does not have the shape the FHIR exchange
    /// requires (wrong entry count, missing location header, ...).
    #[error("unexpected response shape: {0}")]
    ResponseShape(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn response_shape(message: impl Into<String>) -> Self {
        Self::ResponseShape(message.into())
    }
}

/// The transfer engine sees the client as an opaque collaborator; client
/// failures cross the boundary as transport errors, except for engine
/// errors passing back through unchanged.
impl From<ClientError> for TransferError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transfer(inner) => inner,
            other => TransferError::transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
