use crate::error::EndpointError;
use crate::name::SubscriptionName;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use url::Url;

/// Scheme marking a pull subscription, e.g. `pull://orders-subscription`.
pub const PULL_SCHEME: &str = "pull";

/// How events reach a subscriber.
#[derive(Clone, Debug)]
pub enum EndpointKind {
    /// Events are POSTed to this webhook.
    Push(Url),

    /// Events are queued for the named pull subscription.
    Pull(SubscriptionName),
}

/// A validated subscriber of a topic.
///
/// Equality, ordering and hashing use the case-folded canonical form, so two
/// spellings of the same URL that only differ by case are the same endpoint.
#[derive(Clone, Debug)]
pub struct SubscriberEndpoint {
    canonical: String,
    key: String,
    kind: EndpointKind,
}

impl SubscriberEndpoint {
    /// Parses a raw subscriber string.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] when the string is blank, not an absolute
    /// URI, or uses a scheme other than http, https or pull.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EndpointError::Blank);
        }

        let url = Url::parse(raw)?;

        match url.scheme() {
            "http" | "https" => {
                if url.host_str().is_none_or(str::is_empty) {
                    return Err(EndpointError::MissingHost);
                }

                Ok(Self::from_kind(url.to_string(), EndpointKind::Push(url)))
            }
            PULL_SCHEME => {
                let name = url
                    .host_str()
                    .map(SubscriptionName::new)
                    .filter(|name| !name.is_empty())
                    .ok_or(EndpointError::MissingSubscriptionName)?;

                Ok(Self::from_kind(
                    format!("{PULL_SCHEME}://{name}"),
                    EndpointKind::Pull(name),
                ))
            }
            other => Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
    }

    fn from_kind(canonical: String, kind: EndpointKind) -> Self {
        let key = canonical.to_lowercase();
        Self {
            canonical,
            key,
            kind,
        }
    }

    /// Canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Push or pull, with the parsed target.
    #[must_use]
    pub const fn kind(&self) -> &EndpointKind {
        &self.kind
    }

    /// The webhook URL if this is a push subscriber.
    #[must_use]
    pub const fn push_url(&self) -> Option<&Url> {
        match &self.kind {
            EndpointKind::Push(url) => Some(url),
            EndpointKind::Pull(_) => None,
        }
    }

    /// The subscription name if this is a pull subscriber.
    #[must_use]
    pub const fn pull_subscription(&self) -> Option<&SubscriptionName> {
        match &self.kind {
            EndpointKind::Push(_) => None,
            EndpointKind::Pull(name) => Some(name),
        }
    }

    /// The name filters refer to this subscriber by: the subscription name for
    /// pull subscribers, the canonical URL for push subscribers.
    #[must_use]
    pub fn subscription_name(&self) -> SubscriptionName {
        match &self.kind {
            EndpointKind::Push(_) => SubscriptionName::new(&self.canonical),
            EndpointKind::Pull(name) => name.clone(),
        }
    }
}

impl PartialEq for SubscriberEndpoint {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SubscriberEndpoint {}

impl Hash for SubscriberEndpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for SubscriberEndpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubscriberEndpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for SubscriberEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
