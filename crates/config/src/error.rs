use std::path::PathBuf;

use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the configuration file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a subscriber string is rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// Empty or whitespace-only.
    #[error("subscriber is blank")]
    Blank,

    /// Not an absolute URI.
    #[error("subscriber is not an absolute URI: {0}")]
    Malformed(#[from] url::ParseError),

    /// A `pull://` URI without a subscription name.
    #[error("pull subscriber has no subscription name")]
    MissingSubscriptionName,

    /// A push URI without a host.
    #[error("push subscriber has no host")]
    MissingHost,

    /// Scheme other than http, https or pull.
    #[error("unsupported subscriber scheme: {0}")]
    UnsupportedScheme(String),
}
