use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::RehydrationStore;
use crate::record::ResourceInfo;

/// In-process rehydration store. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryRehydration {
    entries: Arc<Mutex<HashMap<String, ResourceInfo>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryRehydration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unavailable store: reads miss and writes are dropped.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RehydrationStore for MemoryRehydration {
    async fn write(&self, url: &str, info: &ResourceInfo) {
        if self.failing.load(Ordering::Relaxed) {
            tracing::debug!(url, "rehydration write dropped");
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), info.clone());
    }

    async fn read(&self, url: &str) -> Option<ResourceInfo> {
        if self.failing.load(Ordering::Relaxed) {
            return None;
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }
}
