use super::publish::{custom_topic_handler, namespace_topic_handler};
use super::pull::subscription_handler;
use crate::Dispatcher;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use eventgrid_delivery::PushTransport;

/// Builds the emulator's routes.
///
/// - `POST /{topic}/api/events` publishes to a custom topic.
/// - `POST /topics/{topic}:publish` publishes to a namespace topic.
/// - `POST /topics/{topic}/eventsubscriptions/{subscription}:{action}` receives
///   from or settles a pull subscription, `action` being one of `receive`,
///   `acknowledge`, `release` or `reject`.
pub fn router<P>(dispatcher: Arc<Dispatcher<P>>) -> Router
where
    P: PushTransport,
{
    Router::new()
        .route("/{topic}/api/events", post(custom_topic_handler::<P>))
        .route("/topics/{topic_action}", post(namespace_topic_handler::<P>))
        .route(
            "/topics/{topic}/eventsubscriptions/{subscription_action}",
            post(subscription_handler::<P>),
        )
        .with_state(dispatcher)
}
