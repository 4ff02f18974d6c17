use std::sync::Arc;

use eventgrid_config::{
    ConfigStore, EndpointKind, SubscriberEndpoint, SubscriptionConfig, SubscriptionName,
    TopicName,
};
use eventgrid_delivery::{
    CancellationRegistry, PushDispatcher, PushPayload, PushTransport, RetryPolicy, SubscriberKey,
};
use eventgrid_events::{DecodeError, Event, PublishBatch, PublishFormat};
use eventgrid_queue::{QueueKey, QueueStore, SubscriptionQueue};
use http::HeaderValue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Result of publishing to a topic.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The events were handed to every subscriber, or there was none.
    Accepted,

    /// The body could not be decoded. Nothing was delivered.
    BadRequest(DecodeError),
}

/// Options for creating a [`Dispatcher`].
pub struct DispatcherOptions<P>
where
    P: PushTransport,
{
    /// Transport for push deliveries.
    pub transport: P,

    /// Retry policy for push deliveries.
    pub retry_policy: RetryPolicy,

    /// Whether filters also apply to push subscribers.
    pub filter_push_subscribers: bool,

    /// Canceled when the emulator shuts down.
    pub shutdown_token: CancellationToken,
}

/// Routes published events to the subscribers of their topic.
///
/// Owns everything a publish or a pull request touches: the active
/// configuration, the cancellation registry, the push dispatcher and the
/// pull queues.
#[derive(Debug)]
pub struct Dispatcher<P>
where
    P: PushTransport,
{
    config: Arc<ConfigStore>,
    registry: Arc<CancellationRegistry>,
    push: PushDispatcher<P>,
    queues: QueueStore<Event>,
    filter_push_subscribers: bool,
}

impl<P> Dispatcher<P>
where
    P: PushTransport,
{
    /// Creates a dispatcher with an empty configuration.
    pub fn new(
        DispatcherOptions {
            transport,
            retry_policy,
            filter_push_subscribers,
            shutdown_token,
        }: DispatcherOptions<P>,
    ) -> Self {
        Self {
            config: Arc::new(ConfigStore::default()),
            registry: Arc::new(CancellationRegistry::new(shutdown_token)),
            push: PushDispatcher::new(transport, retry_policy),
            queues: QueueStore::new(),
            filter_push_subscribers,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config_store(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Cancellation handles of push subscribers.
    #[must_use]
    pub const fn registry(&self) -> &Arc<CancellationRegistry> {
        &self.registry
    }

    /// The push dispatcher.
    #[must_use]
    pub const fn push(&self) -> &PushDispatcher<P> {
        &self.push
    }

    /// The queue of a pull subscription, created if needed.
    pub fn queue(
        &self,
        topic: impl Into<TopicName>,
        subscription: impl Into<SubscriptionName>,
    ) -> Arc<SubscriptionQueue<Event>> {
        self.queues.queue(QueueKey::new(topic, subscription))
    }

    /// Canceled on shutdown. Pending pull receives wait on it.
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken {
        self.registry.shutdown_token()
    }

    /// Decodes a publish request and fans the events out.
    ///
    /// Push subscribers get the whole batch in the background. Pull
    /// subscriptions get the events their filter lets through. Publishing to
    /// a topic without subscribers is accepted.
    pub fn dispatch(
        &self,
        topic: &TopicName,
        body: &[u8],
        content_type: Option<&str>,
    ) -> DispatchOutcome {
        let format = PublishFormat::from_content_type(content_type);

        let mut batch = match PublishBatch::decode(&format, body) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(%topic, "rejected publish: {e}");
                return DispatchOutcome::BadRequest(e);
            }
        };
        batch.stamp_provenance(topic.as_str());

        let config = self.config.load();
        let subscribers = config.subscribers(topic).filter(|s| !s.is_empty());

        let Some(subscribers) = subscribers else {
            warn!(
                %topic,
                "no subscribers for topic, events dropped:\n{}",
                batch.to_pretty_json()
            );
            return DispatchOutcome::Accepted;
        };

        debug!(%topic, events = batch.len(), "dispatching events");

        for subscriber in subscribers {
            match subscriber.kind() {
                EndpointKind::Push(_) => self.push_to(topic, subscriber, &batch, &config),
                EndpointKind::Pull(subscription) => {
                    self.enqueue(topic, subscription, &batch, &config);
                }
            }
        }

        DispatchOutcome::Accepted
    }

    fn push_to(
        &self,
        topic: &TopicName,
        subscriber: &SubscriberEndpoint,
        batch: &PublishBatch,
        config: &SubscriptionConfig,
    ) {
        let filter = self
            .filter_push_subscribers
            .then(|| config.filter(&subscriber.subscription_name()))
            .flatten();

        let filtered;
        let batch = match filter {
            Some(filter) => {
                filtered = batch.filtered(|event_type| filter.accepts(event_type));
                &filtered
            }
            None => batch,
        };

        if batch.is_empty() {
            debug!(%topic, %subscriber, "all events filtered out");
            return;
        }

        let body = match batch.to_body() {
            Ok(body) => body,
            Err(e) => {
                error!(%topic, %subscriber, "failed to encode events: {e}");
                return;
            }
        };

        let payload = PushPayload {
            body,
            content_type: HeaderValue::from_static(batch.content_type()),
        };
        let cancel = self
            .registry
            .get(&SubscriberKey::new(topic.clone(), subscriber.clone()));

        self.push
            .send(topic.clone(), subscriber.clone(), payload, cancel);
    }

    fn enqueue(
        &self,
        topic: &TopicName,
        subscription: &SubscriptionName,
        batch: &PublishBatch,
        config: &SubscriptionConfig,
    ) {
        let filter = config.filter(subscription);

        let events: Vec<Event> = batch
            .to_events()
            .into_iter()
            .filter(|event| filter.is_none_or(|f| f.accepts(event.event_type())))
            .collect();

        if events.is_empty() {
            debug!(%topic, %subscription, "all events filtered out");
            return;
        }

        self.queue(topic.clone(), subscription.clone())
            .add_events(events);
    }

    /// Cancels every pending delivery and waits for the delivery tasks to
    /// end.
    pub async fn shutdown(&self) {
        self.registry.shutdown();
        self.push.close();
        self.push.wait().await;
    }
}
