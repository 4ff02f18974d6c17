use thiserror::Error;

/// Errors that can occur while decoding a publish request.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not valid for the announced schema.
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The content type does not select a known schema.
    #[error("content type '{0}' is not supported")]
    UnsupportedContentType(String),
}
