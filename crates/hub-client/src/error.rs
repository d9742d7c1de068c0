//! Error types for hub-client

use hub_core::CodeType;

/// Result type for hub-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the hub
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status { url: String, status: reqwest::StatusCode },

    /// A page or response did not have the expected shape
    #[error("Unexpected response from {url}: {message}")]
    Markup { url: String, message: String },

    /// The hub refused a source it was asked to save
    #[error("{message}")]
    Rejected { kind: CodeType, message: String },

    #[error("Invalid hub address \"{host}\"")]
    InvalidHost { host: String },
}

impl Error {
    pub fn markup(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Markup {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl From<Error> for hub_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Rejected { kind, message } => hub_core::Error::RemoteValidation { kind, message },
            other => hub_core::Error::transport(other.to_string()),
        }
    }
}
