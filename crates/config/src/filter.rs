use crate::name::{EventType, SubscriptionName};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A filter as written by the user.
///
/// Modeled on event grid's event type filtering: only events whose type is
/// listed in `IncludedEventTypes` reach the subscription.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterOptions {
    /// Subscription the filter applies to.
    #[serde(default, alias = "subscription")]
    pub subscription: Option<String>,

    /// Event types to let through. Absent means everything.
    #[serde(
        default,
        alias = "includedEventTypes",
        skip_serializing_if = "Option::is_none"
    )]
    pub included_event_types: Option<Vec<Option<String>>>,
}

impl FilterOptions {
    /// Filter for `subscription` that lets only `event_types` through.
    pub fn new<I, S>(subscription: impl Into<String>, event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subscription: Some(subscription.into()),
            included_event_types: Some(
                event_types.into_iter().map(|t| Some(t.into())).collect(),
            ),
        }
    }
}

/// A validated filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    subscription: SubscriptionName,
    included_event_types: Option<BTreeSet<EventType>>,
}

impl Filter {
    /// Validates a raw filter. Returns `None` when it names no subscription.
    ///
    /// Blank event types are discarded. A type list that ends up empty is
    /// treated the same as an absent one.
    #[must_use]
    pub fn from_options(options: &FilterOptions) -> Option<Self> {
        let subscription = SubscriptionName::new(options.subscription.as_deref()?);
        if subscription.is_empty() {
            return None;
        }

        let included_event_types = options
            .included_event_types
            .as_ref()
            .map(|types| {
                types
                    .iter()
                    .flatten()
                    .map(EventType::new)
                    .filter(|t| !t.is_empty())
                    .collect::<BTreeSet<_>>()
            })
            .filter(|types| !types.is_empty());

        Some(Self {
            subscription,
            included_event_types,
        })
    }

    /// Subscription this filter applies to.
    #[must_use]
    pub const fn subscription(&self) -> &SubscriptionName {
        &self.subscription
    }

    /// Event types let through, or `None` for all.
    #[must_use]
    pub const fn included_event_types(&self) -> Option<&BTreeSet<EventType>> {
        self.included_event_types.as_ref()
    }

    /// Whether an event of `event_type` passes this filter.
    #[must_use]
    pub fn accepts(&self, event_type: &str) -> bool {
        self.included_event_types
            .as_ref()
            .is_none_or(|types| types.contains(&EventType::new(event_type)))
    }

    /// Converts back into raw form.
    #[must_use]
    pub fn to_options(&self) -> FilterOptions {
        FilterOptions {
            subscription: Some(self.subscription.to_string()),
            included_event_types: self
                .included_event_types
                .as_ref()
                .map(|types| types.iter().map(|t| Some(t.to_string())).collect()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter {{ IncludedEventTypes = [")?;
        if let Some(types) = &self.included_event_types {
            for (i, t) in types.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{t}")?;
            }
        }
        write!(f, "] }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_types_accept_everything() {
        let filter = Filter::from_options(&FilterOptions {
            subscription: Some("sub".to_string()),
            included_event_types: None,
        })
        .unwrap();

        assert!(filter.accepts("anything"));
    }

    #[test]
    fn test_types_restrict() {
        let filter = Filter::from_options(&FilterOptions::new("sub", ["A", "B"])).unwrap();

        assert!(filter.accepts("A"));
        assert!(filter.accepts("b"));
        assert!(!filter.accepts("C"));
    }

    #[test]
    fn test_blank_types_are_dropped() {
        let filter = Filter::from_options(&FilterOptions {
            subscription: Some("sub".to_string()),
            included_event_types: Some(vec![None, Some("  ".to_string())]),
        })
        .unwrap();

        assert_eq!(filter.included_event_types(), None);
    }

    #[test]
    fn test_unnamed_filter_is_rejected() {
        assert_eq!(Filter::from_options(&FilterOptions::default()), None);
        assert_eq!(
            Filter::from_options(&FilterOptions::new(" ", ["A"])),
            None
        );
    }

    #[test]
    fn test_type_order_does_not_matter() {
        let a = Filter::from_options(&FilterOptions::new("sub", ["A", "B"])).unwrap();
        let b = Filter::from_options(&FilterOptions::new("SUB", ["b", "a", "A"])).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let filter = Filter::from_options(&FilterOptions::new("sub", ["b", "a"])).unwrap();

        assert_eq!(filter.to_string(), "Filter { IncludedEventTypes = [a, b] }");
    }
}
