use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The outbound HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single push attempt produced no response.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, TLS or protocol failure. Retried.
    #[error("network error: {0}")]
    Network(String),

    /// Anything else. Ends the delivery.
    #[error("{0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::Unexpected(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}
