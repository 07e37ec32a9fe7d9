//! Error kinds for the report pipeline.
//!
//! Only `NotFound` and `Configuration` are meant to reach the user as
//! failures. `Service` and `MalformedResponse` raised by the model call are
//! absorbed by the report generator and turned into a fallback report.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The requested record does not exist in the data store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An external service (model endpoint or data store) failed.
    #[error("Service error: {0}")]
    Service(String),

    /// The model answered, but not with the expected JSON document.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Required configuration or credentials are missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Map a transport error from reqwest, naming the endpoint it was talking to.
    pub fn from_transport(err: reqwest::Error, endpoint: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            Error::Service(format!(
                "Request to {} timed out after {}s",
                endpoint, timeout_seconds
            ))
        } else if err.is_connect() {
            Error::Service(format!("Cannot connect to {}", endpoint))
        } else {
            Error::Service(format!("Request to {} failed: {}", endpoint, err))
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
