use crate::lock_token::LockToken;
use crate::settle::{FailedLockToken, SettleAction, SettleResult};

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An event handed out by [`SubscriptionQueue::receive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery<T> {
    /// The event.
    pub event: T,

    /// Token to settle the event with.
    pub lock_token: LockToken,
}

/// Outcome of waiting for an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome<T> {
    /// An event was moved in flight.
    Received(Delivery<T>),

    /// The wait was canceled before an event became available.
    Canceled,
}

/// Queue of one pull subscription.
///
/// Pending events wait in an unbounded FIFO. Receiving moves the head into
/// the in-flight table under a fresh lock token, where it stays until it is
/// acknowledged, rejected or released. Locks never expire.
#[derive(Debug)]
pub struct SubscriptionQueue<T> {
    sender: mpsc::UnboundedSender<T>,
    receiver: Mutex<mpsc::UnboundedReceiver<T>>,
    in_flight: DashMap<LockToken, T>,
    last_token: AtomicU64,
}

impl<T> SubscriptionQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            sender,
            receiver: Mutex::new(receiver),
            in_flight: DashMap::new(),
            last_token: AtomicU64::new(0),
        }
    }

    /// Appends an event to the tail.
    pub fn add_event(&self, event: T) {
        // The receiver lives as long as the queue, so this cannot fail.
        let _ = self.sender.send(event);
    }

    /// Appends events to the tail, in order.
    pub fn add_events(&self, events: impl IntoIterator<Item = T>) {
        for event in events {
            self.add_event(event);
        }
    }

    /// Waits for the next pending event and locks it.
    ///
    /// Cancellation leaves the queue untouched.
    #[allow(clippy::significant_drop_tightening)]
    pub async fn receive(&self, cancel: &CancellationToken) -> ReceiveOutcome<T> {
        let mut receiver = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReceiveOutcome::Canceled,
            receiver = self.receiver.lock() => receiver,
        };

        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReceiveOutcome::Canceled,
            event = receiver.recv() => event,
        };

        let Some(event) = event else {
            return ReceiveOutcome::Canceled;
        };

        let lock_token = self.mint_token();
        self.in_flight.insert(lock_token.clone(), event.clone());

        ReceiveOutcome::Received(Delivery { event, lock_token })
    }

    /// Drops an in-flight event. Returns whether the token was in flight.
    pub fn acknowledge(&self, lock_token: &LockToken) -> bool {
        self.in_flight.remove(lock_token).is_some()
    }

    /// Puts an in-flight event back at the tail of the queue, where it will
    /// be handed out again under a new token. Returns whether the token was
    /// in flight.
    pub fn release(&self, lock_token: &LockToken) -> bool {
        self.in_flight
            .remove(lock_token)
            .is_some_and(|(_, event)| self.sender.send(event).is_ok())
    }

    /// Same as [`Self::acknowledge`].
    pub fn reject(&self, lock_token: &LockToken) -> bool {
        self.acknowledge(lock_token)
    }

    /// Applies `action` to each token. Missing tokens are skipped and count
    /// neither as success nor failure.
    pub fn settle<I>(&self, action: SettleAction, lock_tokens: I) -> SettleResult
    where
        I: IntoIterator<Item = Option<LockToken>>,
    {
        let mut result = SettleResult::default();

        for lock_token in lock_tokens.into_iter().flatten() {
            let settled = match action {
                SettleAction::Acknowledge => self.acknowledge(&lock_token),
                SettleAction::Release => self.release(&lock_token),
                SettleAction::Reject => self.reject(&lock_token),
            };

            if settled {
                result.succeeded_lock_tokens.push(lock_token);
            } else {
                debug!(%lock_token, %action, "lock token is not in flight");
                result
                    .failed_lock_tokens
                    .push(FailedLockToken::invalid(lock_token));
            }
        }

        result
    }

    /// Number of received but unsettled events.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    fn mint_token(&self) -> LockToken {
        LockToken::minted(self.last_token.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl<T> Default for SubscriptionQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    async fn receive(queue: &SubscriptionQueue<String>) -> Delivery<String> {
        match queue.receive(&CancellationToken::new()).await {
            ReceiveOutcome::Received(delivery) => delivery,
            ReceiveOutcome::Canceled => panic!("receive was canceled"),
        }
    }

    #[tokio::test]
    async fn test_receive_in_order_then_block() {
        let queue = SubscriptionQueue::new();
        queue.add_events(["a", "b", "c"].map(String::from));

        // Drain everything
        for expected in ["a", "b", "c"] {
            let delivery = receive(&queue).await;
            assert_eq!(delivery.event, expected);
            assert!(queue.acknowledge(&delivery.lock_token));
        }
        assert_eq!(queue.in_flight_len(), 0);

        // Nothing left, so receive waits until canceled
        let cancel = CancellationToken::new();
        let pending = timeout(Duration::from_millis(50), queue.receive(&cancel)).await;
        assert!(pending.is_err());

        cancel.cancel();
        assert_eq!(queue.receive(&cancel).await, ReceiveOutcome::Canceled);
    }

    #[tokio::test]
    async fn test_tokens_are_sequential() {
        let queue = SubscriptionQueue::new();
        queue.add_events(["a", "b"].map(String::from));

        assert_eq!(receive(&queue).await.lock_token.as_str(), "token-1");
        assert_eq!(receive(&queue).await.lock_token.as_str(), "token-2");
    }

    #[tokio::test]
    async fn test_receive_wakes_on_add() {
        let queue = std::sync::Arc::new(SubscriptionQueue::new());

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.receive(&CancellationToken::new()).await })
        };
        tokio::task::yield_now().await;
        queue.add_event("late".to_string());

        let outcome = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_matches!(outcome, ReceiveOutcome::Received(Delivery { event, .. }) if event == "late");
    }

    #[tokio::test]
    async fn test_released_event_comes_back_with_new_token() {
        let queue = SubscriptionQueue::new();
        queue.add_events(["a", "b"].map(String::from));

        let first = receive(&queue).await;
        assert!(queue.release(&first.lock_token));

        // Released events go to the tail
        assert_eq!(receive(&queue).await.event, "b");
        let again = receive(&queue).await;
        assert_eq!(again.event, "a");
        assert_ne!(again.lock_token, first.lock_token);

        // The old token is gone
        assert!(!queue.acknowledge(&first.lock_token));
        assert!(queue.acknowledge(&again.lock_token));
    }

    #[tokio::test]
    async fn test_tokens_settle_once() {
        let queue = SubscriptionQueue::new();
        queue.add_events(["a", "b"].map(String::from));

        let a = receive(&queue).await;
        let b = receive(&queue).await;

        assert!(queue.reject(&a.lock_token));
        assert!(!queue.reject(&a.lock_token));
        assert!(!queue.release(&a.lock_token));
        assert!(queue.acknowledge(&b.lock_token));
        assert!(!queue.acknowledge(&b.lock_token));
    }

    #[tokio::test]
    async fn test_settle_reports_per_token() {
        let queue = SubscriptionQueue::new();
        queue.add_event("a".to_string());
        let delivery = receive(&queue).await;

        let result = queue.settle(
            SettleAction::Release,
            [
                Some(delivery.lock_token.clone()),
                None,
                Some("abcd".into()),
                Some("efgh".into()),
            ],
        );

        assert_eq!(result.succeeded_lock_tokens, vec![delivery.lock_token]);
        assert_eq!(result.failed_lock_tokens.len(), 2);
        assert_eq!(result.failed_lock_tokens[0].lock_token.as_str(), "abcd");
        assert_eq!(result.failed_lock_tokens[0].error.message, "invalid token");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_receivers_share_the_queue() {
        const RECEIVERS: usize = 8;
        const EVENTS: usize = 400;

        let queue = std::sync::Arc::new(SubscriptionQueue::new());
        let receivers: Vec<_> = (0..RECEIVERS)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    let mut received = Vec::new();
                    for _ in 0..EVENTS / RECEIVERS {
                        received.push(receive(&queue).await);
                    }
                    received
                })
            })
            .collect();

        for i in 0..EVENTS {
            queue.add_event(i.to_string());
        }

        let mut events = std::collections::HashSet::new();
        let mut tokens = std::collections::HashSet::new();
        for receiver in receivers {
            let received = timeout(Duration::from_secs(5), receiver)
                .await
                .unwrap()
                .unwrap();
            for delivery in received {
                events.insert(delivery.event);
                tokens.insert(delivery.lock_token);
            }
        }

        assert_eq!(events.len(), EVENTS);
        assert_eq!(tokens.len(), EVENTS);
        assert_eq!(queue.in_flight_len(), EVENTS);
    }

    #[tokio::test]
    async fn test_canceled_receive_keeps_events() {
        let queue = SubscriptionQueue::new();
        queue.add_event("a".to_string());

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(queue.receive(&cancel).await, ReceiveOutcome::Canceled);

        assert_eq!(receive(&queue).await.event, "a");
    }
}
