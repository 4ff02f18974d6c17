use crate::filter::FilterOptions;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Topic configuration exactly as the user wrote it.
///
/// Every level is optional so that partially broken files still load; the
/// corrector decides what survives.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopicOptions {
    /// Topic name to subscriber strings.
    #[serde(default, alias = "topics")]
    pub topics: Option<BTreeMap<String, Option<Vec<Option<String>>>>>,

    /// Per-subscription filters.
    #[serde(default, alias = "filters", skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Option<FilterOptions>>>,
}

impl TopicOptions {
    /// Adds subscribers to `topic`, keeping any already listed.
    #[must_use]
    pub fn with_topic<I, S>(mut self, topic: impl Into<String>, subscribers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics
            .get_or_insert_with(BTreeMap::new)
            .entry(topic.into())
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .extend(subscribers.into_iter().map(|s| Some(s.into())));
        self
    }

    /// Adds a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterOptions) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(Some(filter));
        self
    }
}
