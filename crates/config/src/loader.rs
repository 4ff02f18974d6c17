use crate::error::{Error, Result};
use crate::options::TopicOptions;

use std::io::ErrorKind;
use std::path::Path;

/// Reads raw topic configuration from `path`.
///
/// A missing file is not an error and yields empty options, so the emulator
/// can start before the file exists and pick it up on a later reload.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_options(path: &Path) -> Result<TopicOptions> {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse_options(&bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(TopicOptions::default()),
        Err(source) => Err(Error::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses raw topic configuration. Blank input yields empty options.
///
/// # Errors
///
/// Returns an error if the bytes are not valid configuration JSON.
pub fn parse_options(bytes: &[u8]) -> Result<TopicOptions> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(TopicOptions::default());
    }

    Ok(serde_json::from_slice(bytes)?)
}
