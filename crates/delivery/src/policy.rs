use std::time::Duration;

use http::StatusCode;
use rand::Rng;

/// Delays between push attempts, as event grid applies them.
pub const DEFAULT_RETRY_SCHEDULE: [Duration; 11] = [
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(5 * 60),
    Duration::from_secs(10 * 60),
    Duration::from_secs(30 * 60),
    Duration::from_secs(60 * 60),
    Duration::from_secs(3 * 60 * 60),
    Duration::from_secs(6 * 60 * 60),
    Duration::from_secs(12 * 60 * 60),
    Duration::from_secs(12 * 60 * 60),
];

/// Upper bound (exclusive) of the random delay added to each retry.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(3000);

/// How long a subscriber has to answer one attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Responses that end a delivery: the success codes and the failures event
/// grid does not retry.
pub const NON_RETRIABLE_STATUS_CODES: [StatusCode; 9] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NON_AUTHORITATIVE_INFORMATION,
    StatusCode::NO_CONTENT,
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::PAYLOAD_TOO_LARGE,
];

/// Whether a subscriber answering `status` should be tried again.
#[must_use]
pub fn is_retriable(status: StatusCode) -> bool {
    !NON_RETRIABLE_STATUS_CODES.contains(&status)
}

/// Retry behavior of push deliveries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before each retry. One attempt is made per entry, plus the first.
    pub schedule: Vec<Duration>,

    /// Each delay is extended by a uniform random amount below this.
    pub max_jitter: Duration,

    /// Budget of a single attempt. Exceeding it counts as a retriable failure.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> usize {
        self.schedule.len()
    }

    /// Scheduled delay after attempt number `retry_count` (0-based), or
    /// `None` when that was the last attempt.
    #[must_use]
    pub fn base_delay(&self, retry_count: usize) -> Option<Duration> {
        self.schedule.get(retry_count).copied()
    }

    /// [`Self::base_delay`] with jitter applied.
    #[must_use]
    pub fn delay(&self, retry_count: usize) -> Option<Duration> {
        self.base_delay(retry_count)
            .map(|delay| delay + self.jitter())
    }

    /// A random duration in `[0, max_jitter)`.
    #[must_use]
    pub fn jitter(&self) -> Duration {
        let max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }

        Duration::from_millis(rand::thread_rng().gen_range(0..max))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_RETRY_SCHEDULE.to_vec(),
            max_jitter: DEFAULT_MAX_JITTER,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}
