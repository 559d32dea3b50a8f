use anyhow::Result;
use serde_json::Value;

/// Key/value sink for raw pipeline payloads (an object store or data lake).
///
/// The pipeline treats the store as optional: a failing `put` is reported
/// but never aborts a run.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, payload: &Value) -> Result<()>;
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
