use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one received but not yet settled event of a queue.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LockToken(String);

impl LockToken {
    pub(crate) fn minted(sequence: u64) -> Self {
        Self(format!("token-{sequence}"))
    }

    /// The token as sent to clients.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LockToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for LockToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
