use crate::lock_token::LockToken;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message reported for tokens that are unknown or already settled.
pub const INVALID_TOKEN_MESSAGE: &str = "invalid token";

/// What to do with a received event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleAction {
    /// Processing succeeded, drop the event.
    Acknowledge,

    /// Give the event back to the queue for another receive.
    Release,

    /// Processing failed, drop the event. There is no dead-letter queue.
    Reject,
}

impl fmt::Display for SettleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledge => f.write_str("acknowledge"),
            Self::Release => f.write_str("release"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Error detail attached to a failed token.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct SettleError {
    /// Machine readable code, never set by the emulator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human readable reason.
    pub message: String,
}

/// A token that could not be settled.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedLockToken {
    /// The token as sent by the client.
    pub lock_token: LockToken,

    /// Why it failed.
    pub error: SettleError,
}

impl FailedLockToken {
    pub(crate) fn invalid(lock_token: LockToken) -> Self {
        Self {
            lock_token,
            error: SettleError {
                code: None,
                message: INVALID_TOKEN_MESSAGE.to_string(),
            },
        }
    }
}

/// Per-token outcome of settling a batch of lock tokens.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResult {
    /// Tokens that could not be settled.
    pub failed_lock_tokens: Vec<FailedLockToken>,

    /// Tokens that were settled.
    pub succeeded_lock_tokens: Vec<LockToken>,
}
