use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spring HATEOAS collection: `{_embedded: {<key>: [...]}, _links: ..., page: ...}`.
///
/// Spring omits `_embedded` entirely for empty collections, so it defaults to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEnvelope<T> {
    #[serde(rename = "_embedded", default = "BTreeMap::new")]
    pub embedded: BTreeMap<String, Vec<T>>,
    #[serde(rename = "_links", default, skip_serializing_if = "Value::is_null")]
    pub links: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMetadata>,
}

impl<T> CollectionEnvelope<T> {
    pub fn into_items(mut self, key: &str) -> Vec<T> {
        self.embedded.remove(key).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
}
