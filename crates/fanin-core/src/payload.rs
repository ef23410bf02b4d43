use crate::data::DataBag;
use serde_json::{Map, Value};

/// Optional data attached to a completion report.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CompletionPayload {
    #[default]
    None,
    /// Set one key on the shared bag.
    KeyValue(String, Value),
    /// Merge every entry into the shared bag, last write wins.
    Patch(Map<String, Value>),
}

impl CompletionPayload {
    pub fn key_value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::KeyValue(key.into(), value.into())
    }

    pub fn patch<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Patch(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub(crate) fn apply(self, data: &DataBag) {
        match self {
            Self::None => {}
            Self::KeyValue(key, value) => {
                data.insert(key, value);
            }
            Self::Patch(patch) => data.merge(patch),
        }
    }
}

impl From<Map<String, Value>> for CompletionPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Patch(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn none_leaves_bag_untouched() {
        let bag = DataBag::new();
        CompletionPayload::None.apply(&bag);
        assert!(bag.is_empty());
        assert!(CompletionPayload::default().is_none());
    }

    #[test]
    fn key_value_sets_one_entry() {
        let bag = DataBag::new();
        CompletionPayload::key_value("k", "v").apply(&bag);
        assert_eq!(bag.get("k"), Some(json!("v")));
    }

    #[test]
    fn patch_overwrites_existing_keys() {
        let bag = DataBag::new();
        bag.insert("key0", "value0");
        bag.insert("key1", "old");
        CompletionPayload::patch([("key1", "value1"), ("key2", "value2")]).apply(&bag);
        assert_eq!(
            Value::Object(bag.snapshot()),
            json!({ "key0": "value0", "key1": "value1", "key2": "value2" })
        );
    }
}
