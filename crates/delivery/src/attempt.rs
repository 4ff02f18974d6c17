use std::fmt;
use std::time::Duration;

use eventgrid_config::{SubscriberEndpoint, TopicName};
use http::StatusCode;
use humantime::format_duration;
use tracing::{info, warn};

/// Bookkeeping of one delivery, from the first attempt to the last retry.
#[derive(Clone, Debug)]
pub struct DeliveryAttempt {
    id: String,
    topic: TopicName,
    subscriber: SubscriberEndpoint,
    retry_count: usize,
    max_retry_count: usize,
}

impl DeliveryAttempt {
    /// Starts tracking delivery number `sequence`.
    #[must_use]
    pub fn new(
        sequence: u64,
        topic: TopicName,
        subscriber: SubscriberEndpoint,
        max_retry_count: usize,
    ) -> Self {
        Self {
            id: format!("{sequence:04}"),
            topic,
            subscriber,
            retry_count: 0,
            max_retry_count,
        }
    }

    /// Zero-padded delivery id used in logs.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 0 for the first attempt, 1 for the first retry and so on.
    #[must_use]
    pub const fn retry_count(&self) -> usize {
        self.retry_count
    }

    /// Whether no retry follows the current attempt.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.retry_count >= self.max_retry_count
    }

    /// Moves on to the next attempt. Saturates at the last one.
    pub const fn advance(&mut self) {
        if !self.is_last() {
            self.retry_count += 1;
        }
    }

    fn progress(&self) -> Progress {
        Progress {
            attempt: self.retry_count + 1,
            max: self.max_retry_count + 1,
        }
    }

    pub(crate) fn log_started(&self) {
        info!(
            topic = %self.topic,
            subscriber = %self.subscriber,
            attempt = %self.progress(),
            "sending event {} ...",
            self.id
        );
    }

    pub(crate) fn log_response(&self, status: StatusCode, next_delay: Option<Duration>) {
        if status.is_success() && !crate::is_retriable(status) {
            info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                status = status.as_u16(),
                "sending event {} succeeded",
                self.id
            );
            return;
        }

        match next_delay {
            Some(delay) => info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                status = status.as_u16(),
                "sending event {} returned {}, retrying in ~{}",
                self.id,
                status.as_u16(),
                format_duration(delay)
            ),
            None => info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                status = status.as_u16(),
                "sending event {} returned {}, this was the last attempt",
                self.id,
                status.as_u16()
            ),
        }
    }

    pub(crate) fn log_failed(&self, reason: &str, next_delay: Option<Duration>) {
        match next_delay {
            Some(delay) => info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                %reason,
                "sending event {} failed, retrying in ~{}",
                self.id,
                format_duration(delay)
            ),
            None => info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                %reason,
                "sending event {} failed, this was the last attempt",
                self.id
            ),
        }
    }

    pub(crate) fn log_timed_out(&self, next_delay: Option<Duration>) {
        match next_delay {
            Some(delay) => info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                "sending event {} timed out, retrying in ~{}",
                self.id,
                format_duration(delay)
            ),
            None => info!(
                topic = %self.topic,
                subscriber = %self.subscriber,
                attempt = %self.progress(),
                "sending event {} timed out, this was the last attempt",
                self.id
            ),
        }
    }

    pub(crate) fn log_canceled(&self) {
        info!(
            topic = %self.topic,
            subscriber = %self.subscriber,
            attempt = %self.progress(),
            "sending event {} was canceled",
            self.id
        );
    }

    pub(crate) fn log_unexpected(&self, reason: &str) {
        warn!(
            topic = %self.topic,
            subscriber = %self.subscriber,
            attempt = %self.progress(),
            "sending event {} failed for an unexpected reason: {}",
            self.id,
            reason
        );
    }
}

struct Progress {
    attempt: usize,
    max: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.attempt, self.max)
    }
}
