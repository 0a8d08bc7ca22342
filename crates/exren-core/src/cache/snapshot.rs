//! Serializable form of the whole cache.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::{PageContextRecord, ResourceRecord};

/// Everything the cache holds, in iteration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(default)]
    pub resources: IndexMap<String, ResourceRecord>,
    #[serde(default)]
    pub page_contexts: IndexMap<String, PageContextRecord>,
}

fn default_version() -> u8 {
    1
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self {
            version: default_version(),
            resources: IndexMap::new(),
            page_contexts: IndexMap::new(),
        }
    }
}
