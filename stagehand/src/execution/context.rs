//! Request-scoped store of per-module cross-stage state.

use crate::hook::ModuleContext;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe map of `module code -> context bucket`, shared by all
/// stages of one request.
///
/// Hooks read a snapshot of their module's bucket and return updates; the
/// group runner merges updates in plan order, so concurrent writes cannot
/// occur. The handle is cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ModuleContextStore {
    ctxs: Arc<DashMap<String, ModuleContext>>,
}

impl ModuleContextStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the module's bucket, empty if the module has not
    /// stored anything yet.
    pub fn snapshot(&self, module: &str) -> ModuleContext {
        self.ctxs
            .get(module)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Merges `update` into the module's bucket.
    ///
    /// Mentioned keys are set or overwritten; keys absent from `update`
    /// are preserved. An empty update still materializes the bucket.
    pub fn merge(&self, module: &str, update: ModuleContext) {
        let mut entry = self.ctxs.entry(module.to_string()).or_default();
        for (key, value) in update {
            entry.insert(key, value);
        }
    }

    /// Number of modules with a bucket.
    pub fn len(&self) -> usize {
        self.ctxs.len()
    }

    /// Returns true if no module has stored anything.
    pub fn is_empty(&self) -> bool {
        self.ctxs.is_empty()
    }

    /// Copies the whole store, for inspection and debug output.
    pub fn snapshot_all(&self) -> HashMap<String, ModuleContext> {
        self.ctxs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_of_unknown_module_is_empty() {
        let store = ModuleContextStore::new();
        assert!(store.snapshot("module-1").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_creates_bucket() {
        let store = ModuleContextStore::new();
        store.merge(
            "module-1",
            ModuleContext::from([("k1".to_string(), json!("v1"))]),
        );

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot("module-1")["k1"], json!("v1"));
    }

    #[test]
    fn test_merge_preserves_unmentioned_keys() {
        let store = ModuleContextStore::new();
        store.merge(
            "module-1",
            ModuleContext::from([("k1".to_string(), json!("v1"))]),
        );
        store.merge(
            "module-1",
            ModuleContext::from([("k2".to_string(), json!("v2"))]),
        );

        let bucket = store.snapshot("module-1");
        assert_eq!(bucket["k1"], json!("v1"));
        assert_eq!(bucket["k2"], json!("v2"));
    }

    #[test]
    fn test_merge_overwrites_mentioned_keys() {
        let store = ModuleContextStore::new();
        store.merge(
            "module-1",
            ModuleContext::from([("k1".to_string(), json!("old"))]),
        );
        store.merge(
            "module-1",
            ModuleContext::from([("k1".to_string(), json!("new"))]),
        );

        assert_eq!(store.snapshot("module-1")["k1"], json!("new"));
    }

    #[test]
    fn test_empty_merge_materializes_bucket() {
        let store = ModuleContextStore::new();
        store.merge("module-1", ModuleContext::new());

        assert_eq!(store.len(), 1);
        assert!(store.snapshot("module-1").is_empty());
    }

    #[test]
    fn test_buckets_are_isolated_per_module() {
        let store = ModuleContextStore::new();
        store.merge(
            "module-1",
            ModuleContext::from([("k".to_string(), json!(1))]),
        );
        store.merge(
            "module-2",
            ModuleContext::from([("k".to_string(), json!(2))]),
        );

        assert_eq!(store.snapshot("module-1")["k"], json!(1));
        assert_eq!(store.snapshot("module-2")["k"], json!(2));
    }
}
