use crate::error::TransportError;
use crate::transport::{PushRequest, PushTransport};

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// What the [`MockTransport`] does for one request.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Answer with this status.
    Status(StatusCode),

    /// Fail with a network error.
    NetworkError,

    /// Fail with an unexpected error.
    Unexpected(String),

    /// Never answer.
    Hang,

    /// Panic inside the delivery.
    Panic,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockResponse>,
    fallback: Option<MockResponse>,
    requests: Vec<PushRequest>,
}

/// Scripted in-memory [`PushTransport`] for tests.
///
/// Responses are played back in order; once the script is exhausted the
/// fallback is used, or 200 when there is none. Every request is recorded.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    sent: Arc<Notify>,
}

impl MockTransport {
    /// A transport answering 200 to everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport playing back `script`.
    #[must_use]
    pub fn scripted(script: impl IntoIterator<Item = MockResponse>) -> Self {
        let transport = Self::default();
        transport.state.lock().script = script.into_iter().collect();
        transport
    }

    /// A transport always doing `response`.
    #[must_use]
    pub fn always(response: MockResponse) -> Self {
        let transport = Self::default();
        transport.state.lock().fallback = Some(response);
        transport
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PushRequest> {
        self.state.lock().requests.clone()
    }

    /// Waits until at least `count` requests were received.
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let notified = self.sent.notified();
            if self.state.lock().requests.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    async fn send(&self, request: PushRequest) -> Result<StatusCode, TransportError> {
        let response = {
            let mut state = self.state.lock();
            state.requests.push(request);
            state
                .script
                .pop_front()
                .or_else(|| state.fallback.clone())
                .unwrap_or(MockResponse::Status(StatusCode::OK))
        };
        self.sent.notify_waiters();

        match response {
            MockResponse::Status(status) => Ok(status),
            MockResponse::NetworkError => Err(TransportError::Network("connection refused".to_string())),
            MockResponse::Unexpected(reason) => Err(TransportError::Unexpected(reason)),
            MockResponse::Hang => std::future::pending().await,
            MockResponse::Panic => panic!("mock transport panicked"),
        }
    }
}
