use super::split_action;
use crate::{DispatchOutcome, Dispatcher};

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use eventgrid_config::TopicName;
use eventgrid_delivery::PushTransport;
use serde_json::json;

fn publish<P>(
    dispatcher: &Dispatcher<P>,
    topic: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> DispatchOutcome
where
    P: PushTransport,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    dispatcher.dispatch(&TopicName::new(topic), body, content_type)
}

/// Handler for `POST /{topic}/api/events`. Answers with an empty body.
pub async fn custom_topic_handler<P>(
    State(dispatcher): State<Arc<Dispatcher<P>>>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode
where
    P: PushTransport,
{
    match publish(&dispatcher, &topic, &headers, &body) {
        DispatchOutcome::Accepted => StatusCode::OK,
        DispatchOutcome::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
}

/// Handler for `POST /topics/{topic}:publish`. Answers with `{}`.
pub async fn namespace_topic_handler<P>(
    State(dispatcher): State<Arc<Dispatcher<P>>>,
    Path(topic_action): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    P: PushTransport,
{
    let Some((topic, action)) = split_action(&topic_action) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !action.eq_ignore_ascii_case("publish") {
        return StatusCode::NOT_FOUND.into_response();
    }

    match publish(&dispatcher, topic, &headers, &body) {
        DispatchOutcome::Accepted => Json(json!({})).into_response(),
        DispatchOutcome::BadRequest(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}
