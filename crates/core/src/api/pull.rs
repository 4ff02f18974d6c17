use super::split_action;
use crate::Dispatcher;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use eventgrid_delivery::PushTransport;
use eventgrid_events::Event;
use eventgrid_queue::{Delivery, LockToken, ReceiveOutcome, SettleAction};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::warn;

/// Query parameters of a receive request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveParams {
    /// Seconds to wait for an event before answering with none.
    pub max_wait_time: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrokerProperties {
    delivery_count: u32,
    lock_token: LockToken,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceiveDetails {
    broker_properties: BrokerProperties,
    event: Event,
}

#[derive(Debug, Serialize)]
struct ReceiveResponse {
    value: Vec<ReceiveDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockTokensRequest {
    #[serde(default)]
    lock_tokens: Option<Vec<Option<String>>>,
}

/// Handler for `POST /topics/{topic}/eventsubscriptions/{subscription}:{action}`.
pub async fn subscription_handler<P>(
    State(dispatcher): State<Arc<Dispatcher<P>>>,
    Path((topic, subscription_action)): Path<(String, String)>,
    Query(params): Query<ReceiveParams>,
    body: Bytes,
) -> Response
where
    P: PushTransport,
{
    let Some((subscription, action)) = split_action(&subscription_action) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let action = match action.to_ascii_lowercase().as_str() {
        "receive" => {
            let max_wait = params.max_wait_time.map(Duration::from_secs);
            return receive(&dispatcher, &topic, subscription, max_wait).await;
        }
        "acknowledge" => SettleAction::Acknowledge,
        "release" => SettleAction::Release,
        "reject" => SettleAction::Reject,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    settle(&dispatcher, &topic, subscription, action, &body)
}

async fn receive<P>(
    dispatcher: &Dispatcher<P>,
    topic: &str,
    subscription: &str,
    max_wait: Option<Duration>,
) -> Response
where
    P: PushTransport,
{
    let queue = dispatcher.queue(topic, subscription);
    let cancel = dispatcher.shutdown_token().child_token();

    let outcome = match max_wait {
        Some(max_wait) => timeout(max_wait, queue.receive(&cancel))
            .await
            .unwrap_or(ReceiveOutcome::Canceled),
        None => queue.receive(&cancel).await,
    };

    let value = match outcome {
        ReceiveOutcome::Received(Delivery { event, lock_token }) => vec![ReceiveDetails {
            // Redeliveries are not counted
            broker_properties: BrokerProperties {
                delivery_count: 1,
                lock_token,
            },
            event,
        }],
        ReceiveOutcome::Canceled => Vec::new(),
    };

    Json(ReceiveResponse { value }).into_response()
}

fn settle<P>(
    dispatcher: &Dispatcher<P>,
    topic: &str,
    subscription: &str,
    action: SettleAction,
    body: &Bytes,
) -> Response
where
    P: PushTransport,
{
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        LockTokensRequest::default()
    } else {
        match serde_json::from_slice::<LockTokensRequest>(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(%topic, %subscription, %action, "invalid lock tokens request: {e}");
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    };

    let lock_tokens = request
        .lock_tokens
        .unwrap_or_default()
        .into_iter()
        .map(|token| token.map(LockToken::from));

    Json(dispatcher.queue(topic, subscription).settle(action, lock_tokens)).into_response()
}
