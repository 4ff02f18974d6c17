use crate::attempt::DeliveryAttempt;
use crate::error::TransportError;
use crate::policy::{RetryPolicy, is_retriable};
use crate::transport::{PushRequest, PushTransport};

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use eventgrid_config::{SubscriberEndpoint, TopicName};
use futures::FutureExt;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::error;

/// 0-based number of the attempt.
pub const DELIVERY_COUNT_HEADER: HeaderName = HeaderName::from_static("aeg-delivery-count");

/// Always `Notification`.
pub const EVENT_TYPE_HEADER: HeaderName = HeaderName::from_static("aeg-event-type");

/// Name of the emulated event subscription.
pub const SUBSCRIPTION_NAME_HEADER: HeaderName = HeaderName::from_static("aeg-subscription-name");

/// Always `1`.
pub const METADATA_VERSION_HEADER: HeaderName = HeaderName::from_static("aeg-metadata-version");

/// Always `1.0`.
pub const DATA_VERSION_HEADER: HeaderName = HeaderName::from_static("aeg-data-version");

/// Body of a push delivery.
#[derive(Clone, Debug)]
pub struct PushPayload {
    /// JSON array of events.
    pub body: Bytes,

    /// Content type matching the event schema.
    pub content_type: HeaderValue,
}

/// How a delivery ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The subscriber accepted the events.
    Delivered(StatusCode),

    /// The subscriber answered with a status that is not retried.
    Rejected(StatusCode),

    /// Every attempt failed.
    Exhausted,

    /// The subscriber was removed or the emulator shut down.
    Canceled,

    /// An unexpected error ended the delivery.
    Failed(String),
}

/// Pushes event batches to webhooks, retrying like event grid does.
///
/// Each delivery runs as its own tracked task. Deliveries never report back
/// to the publisher; their outcome is only logged.
#[derive(Debug)]
pub struct PushDispatcher<P>
where
    P: PushTransport,
{
    transport: P,
    policy: Arc<RetryPolicy>,
    sequence: Arc<AtomicU64>,
    task_tracker: TaskTracker,
}

impl<P> Clone for PushDispatcher<P>
where
    P: PushTransport,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            policy: self.policy.clone(),
            sequence: self.sequence.clone(),
            task_tracker: self.task_tracker.clone(),
        }
    }
}

impl<P> PushDispatcher<P>
where
    P: PushTransport,
{
    /// Creates a dispatcher.
    pub fn new(transport: P, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy: Arc::new(policy),
            sequence: Arc::new(AtomicU64::new(0)),
            task_tracker: TaskTracker::new(),
        }
    }

    /// The retry policy in use.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Starts delivering `payload` in the background and returns at once.
    ///
    /// A panic inside the delivery is logged and does not reach the caller
    /// or other deliveries.
    pub fn send(
        &self,
        topic: TopicName,
        subscriber: SubscriberEndpoint,
        payload: PushPayload,
        cancel: CancellationToken,
    ) {
        let dispatcher = self.clone();

        self.task_tracker.spawn(async move {
            let delivery = dispatcher.deliver(topic.clone(), subscriber.clone(), payload, cancel);

            if let Err(panic) = AssertUnwindSafe(delivery).catch_unwind().await {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!(%topic, %subscriber, %reason, "delivery task panicked");
            }
        });
    }

    /// Delivers `payload`, retrying on failure, until the subscriber accepts
    /// or rejects it, attempts run out, or `cancel` fires.
    ///
    /// A timed out attempt is retried. Cancellation stops the current attempt
    /// and every retry after it.
    pub async fn deliver(
        &self,
        topic: TopicName,
        subscriber: SubscriberEndpoint,
        payload: PushPayload,
        cancel: CancellationToken,
    ) -> DeliveryOutcome {
        let Some(url) = subscriber.push_url().cloned() else {
            return DeliveryOutcome::Failed(format!("{subscriber} is not a push subscriber"));
        };

        let mut attempt = DeliveryAttempt::new(
            self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            topic,
            subscriber,
            self.policy.max_retries(),
        );

        loop {
            attempt.log_started();

            let request = PushRequest {
                url: url.clone(),
                headers: headers(&attempt, &payload),
                body: payload.body.clone(),
            };

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    attempt.log_canceled();
                    return DeliveryOutcome::Canceled;
                }
                result = timeout(self.policy.attempt_timeout, self.transport.send(request)) => result,
            };

            let next_delay = self.policy.base_delay(attempt.retry_count());

            match result {
                Ok(Ok(status)) if !is_retriable(status) => {
                    attempt.log_response(status, None);
                    return if status.is_success() {
                        DeliveryOutcome::Delivered(status)
                    } else {
                        DeliveryOutcome::Rejected(status)
                    };
                }
                Ok(Ok(status)) => attempt.log_response(status, next_delay),
                Ok(Err(TransportError::Network(reason))) => attempt.log_failed(&reason, next_delay),
                Ok(Err(TransportError::Unexpected(reason))) => {
                    attempt.log_unexpected(&reason);
                    return DeliveryOutcome::Failed(reason);
                }
                Err(_elapsed) => attempt.log_timed_out(next_delay),
            }

            let Some(delay) = self.policy.delay(attempt.retry_count()) else {
                return DeliveryOutcome::Exhausted;
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    attempt.log_canceled();
                    return DeliveryOutcome::Canceled;
                }
                () = sleep(delay) => {}
            }

            attempt.advance();
        }
    }

    /// Lets [`Self::wait`] return once running deliveries are done.
    pub fn close(&self) {
        self.task_tracker.close();
    }

    /// Waits for every delivery to finish, after [`Self::close`].
    pub async fn wait(&self) {
        self.task_tracker.wait().await;
    }

    /// Number of deliveries still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.task_tracker.len()
    }
}

fn headers(attempt: &DeliveryAttempt, payload: &PushPayload) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(6);

    headers.insert(CONTENT_TYPE, payload.content_type.clone());
    headers.insert(DELIVERY_COUNT_HEADER, HeaderValue::from(attempt.retry_count()));
    headers.insert(EVENT_TYPE_HEADER, HeaderValue::from_static("Notification"));
    headers.insert(
        SUBSCRIPTION_NAME_HEADER,
        HeaderValue::from_static("EventGridEmulator"),
    );
    headers.insert(METADATA_VERSION_HEADER, HeaderValue::from_static("1"));
    headers.insert(DATA_VERSION_HEADER, HeaderValue::from_static("1.0"));

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CancellationRegistry, MockResponse, MockTransport, SubscriberKey};

    use std::time::Duration;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn payload() -> PushPayload {
        PushPayload {
            body: Bytes::from_static(br#"[{"id":"1"}]"#),
            content_type: HeaderValue::from_static("application/json"),
        }
    }

    fn hook() -> SubscriberEndpoint {
        SubscriberEndpoint::parse("https://localhost/hook").unwrap()
    }

    fn status(code: u16) -> MockResponse {
        MockResponse::Status(StatusCode::from_u16(code).unwrap())
    }

    async fn deliver(transport: &MockTransport) -> DeliveryOutcome {
        PushDispatcher::new(transport.clone(), RetryPolicy::default())
            .deliver("orders".into(), hook(), payload(), CancellationToken::new())
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_not_retried() {
        let transport = MockTransport::new();

        assert_eq!(deliver(&transport).await, DeliveryOutcome::Delivered(StatusCode::OK));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_is_not_retried() {
        let transport = MockTransport::always(status(400));

        assert_eq!(
            deliver(&transport).await,
            DeliveryOutcome::Rejected(StatusCode::BAD_REQUEST)
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_retried_until_success() {
        let transport = MockTransport::scripted([status(404), status(200)]);

        assert_eq!(deliver(&transport).await, DeliveryOutcome::Delivered(StatusCode::OK));

        let counts: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.headers[&DELIVERY_COUNT_HEADER].to_str().unwrap().to_string())
            .collect();
        assert_eq!(counts, vec!["0", "1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_follow_the_schedule() {
        let transport = MockTransport::always(status(500));
        let started = tokio::time::Instant::now();

        assert_eq!(deliver(&transport).await, DeliveryOutcome::Exhausted);

        let elapsed = started.elapsed();
        let scheduled: Duration = RetryPolicy::default().schedule.iter().sum();
        assert_eq!(transport.requests().len(), 12);
        assert!(elapsed >= scheduled);
        assert!(elapsed < scheduled + Duration::from_secs(3 * 11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_and_network_errors_are_retried() {
        let transport = MockTransport::scripted([
            MockResponse::Hang,
            MockResponse::NetworkError,
            status(202),
        ]);

        assert_eq!(
            deliver(&transport).await,
            DeliveryOutcome::Delivered(StatusCode::ACCEPTED)
        );
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_error_ends_delivery() {
        let transport = MockTransport::always(MockResponse::Unexpected("boom".to_string()));

        assert_matches!(deliver(&transport).await, DeliveryOutcome::Failed(reason) if reason == "boom");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_cancels_pending_retry() {
        let transport = MockTransport::always(status(503));
        let dispatcher = PushDispatcher::new(transport.clone(), RetryPolicy::default());
        let registry = CancellationRegistry::default();
        let key = SubscriberKey::new("orders".into(), hook());
        registry.register(&key);

        let delivery = {
            let dispatcher = dispatcher.clone();
            let cancel = registry.get(&key);
            tokio::spawn(async move {
                dispatcher
                    .deliver("orders".into(), hook(), payload(), cancel)
                    .await
            })
        };

        // First attempt failed, the delivery now waits for its first retry
        transport.wait_for_requests(1).await;
        sleep(Duration::from_secs(1)).await;
        registry.unregister(&key);

        assert_eq!(delivery.await.unwrap(), DeliveryOutcome::Canceled);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregister_cancels_hanging_attempt() {
        let transport = MockTransport::always(MockResponse::Hang);
        let dispatcher = PushDispatcher::new(transport.clone(), RetryPolicy::default());
        let registry = CancellationRegistry::default();
        let key = SubscriberKey::new("orders".into(), hook());
        registry.register(&key);
        let started = tokio::time::Instant::now();

        let delivery = {
            let dispatcher = dispatcher.clone();
            let cancel = registry.get(&key);
            tokio::spawn(async move {
                dispatcher
                    .deliver("orders".into(), hook(), payload(), cancel)
                    .await
            })
        };

        // Still inside the first attempt's timeout
        transport.wait_for_requests(1).await;
        sleep(Duration::from_secs(5)).await;
        registry.unregister(&key);

        assert_eq!(delivery.await.unwrap(), DeliveryOutcome::Canceled);
        assert_eq!(transport.requests().len(), 1);
        assert!(started.elapsed() < RetryPolicy::default().attempt_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_headers() {
        let transport = MockTransport::new();

        deliver(&transport).await;

        let request = &transport.requests()[0];
        assert_eq!(request.url.as_str(), "https://localhost/hook");
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.headers[&EVENT_TYPE_HEADER], "Notification");
        assert_eq!(request.headers[&SUBSCRIPTION_NAME_HEADER], "EventGridEmulator");
        assert_eq!(request.headers[&METADATA_VERSION_HEADER], "1");
        assert_eq!(request.headers[&DATA_VERSION_HEADER], "1.0");
        assert_eq!(request.body, payload().body);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_survives_panics() {
        let transport = MockTransport::scripted([MockResponse::Panic]);
        let dispatcher = PushDispatcher::new(transport.clone(), RetryPolicy::default());

        dispatcher.send("orders".into(), hook(), payload(), CancellationToken::new());
        dispatcher.send("orders".into(), hook(), payload(), CancellationToken::new());
        dispatcher.close();
        dispatcher.wait().await;

        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_pull_subscriber_is_refused() {
        let dispatcher = PushDispatcher::new(MockTransport::new(), RetryPolicy::default());

        let outcome = dispatcher
            .deliver(
                "orders".into(),
                SubscriberEndpoint::parse("pull://sub").unwrap(),
                payload(),
                CancellationToken::new(),
            )
            .await;

        assert_matches!(outcome, DeliveryOutcome::Failed(_));
    }
}
