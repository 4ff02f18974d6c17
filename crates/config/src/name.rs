use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

macro_rules! case_insensitive_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            name: String,
            key: String,
        }

        impl $name {
            /// Creates a new name. Surrounding whitespace is trimmed.
            pub fn new(name: impl AsRef<str>) -> Self {
                let name = name.as_ref().trim().to_string();
                let key = name.to_lowercase();
                Self { name, key }
            }

            /// The name as it was first written.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.name
            }

            /// Whether the trimmed name is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.name.is_empty()
            }

            /// Case-folded form used for comparisons.
            #[must_use]
            pub fn key(&self) -> &str {
                &self.key
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.key.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.key.cmp(&other.key)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.name)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.name
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self::new(name)
            }
        }
    };
}

case_insensitive_name!(
    /// Name of a topic. Compared case-insensitively.
    TopicName
);

case_insensitive_name!(
    /// Name of a pull subscription, or the canonical URL of a push subscriber
    /// when used as a filter key. Compared case-insensitively.
    SubscriptionName
);

case_insensitive_name!(
    /// An event type as used in filters. Compared case-insensitively.
    EventType
);

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    #[test]
    fn test_names_compare_case_insensitively() {
        assert_eq!(TopicName::new("Orders"), TopicName::new("orders"));
        assert_ne!(TopicName::new("orders"), TopicName::new("customers"));
    }

    #[test]
    fn test_names_are_trimmed() {
        let name = TopicName::new("  orders \t");
        assert_eq!(name.as_str(), "orders");
        assert!(TopicName::new("   ").is_empty());
    }

    #[test]
    fn test_set_keeps_first_spelling() {
        let mut set = BTreeSet::new();
        set.insert(SubscriptionName::new("MySub"));
        set.insert(SubscriptionName::new("mysub"));

        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().as_str(), "MySub");
    }
}
