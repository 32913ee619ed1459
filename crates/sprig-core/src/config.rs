//! Component user configuration
//!
//! The core treats configuration as an opaque handle: it is stored in each
//! component's descriptor and narrowed to a sub-tree when a component is
//! nested. Loading goes through the [`ConfigSource`] seam.

use crate::errors::{Result, SprigError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Opaque, cheaply clonable configuration handle.
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfig {
    root: Arc<Value>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl UserConfig {
    /// An empty configuration object.
    pub fn empty() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Wraps an existing JSON tree.
    pub fn from_value(value: Value) -> Self {
        Self {
            root: Arc::new(value),
        }
    }

    /// The underlying JSON tree.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Looks up a value by dotted path (`"db.pool.size"`).
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(self.root.as_ref(), |node, part| node.as_object()?.get(part))
    }

    /// Looks up a string value by dotted path.
    pub fn lookup_str(&self, key: &str) -> Option<&str> {
        self.lookup(key).and_then(Value::as_str)
    }

    /// The configuration sub-tree belonging to a nested component.
    ///
    /// Missing or non-object entries yield an empty configuration.
    pub fn subconfig(&self, name: &str) -> Self {
        match self.root.get(name) {
            Some(sub @ Value::Object(_)) => Self::from_value(sub.clone()),
            _ => Self::empty(),
        }
    }

    /// Returns a new handle with `overlay` merged on top of this one.
    pub fn merged(&self, overlay: &Value) -> Self {
        let mut merged = self.root.as_ref().clone();
        merge_json_values(&mut merged, overlay);
        Self::from_value(merged)
    }
}

/// Merge two JSON values recursively
pub fn merge_json_values(target: &mut Value, source: &Value) {
    match (target.as_object_mut(), source.as_object()) {
        (Some(target_obj), Some(source_obj)) => {
            for (key, source_value) in source_obj {
                match target_obj.get_mut(key) {
                    Some(target_value) => merge_json_values(target_value, source_value),
                    None => {
                        target_obj.insert(key.clone(), source_value.clone());
                    }
                }
            }
        }
        // non-objects: source overwrites target
        _ => *target = source.clone(),
    }
}

/// Source of per-component configuration overlays.
pub trait ConfigSource: Send + Sync {
    /// Loads the overlay for the component rooted at `dir` in `environment`.
    ///
    /// Returns `Ok(None)` when there is nothing to load.
    fn load(&self, dir: &Path, environment: &str) -> Result<Option<Value>>;
}

/// Loads nothing; every component keeps its inherited configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl ConfigSource for NullSource {
    fn load(&self, _dir: &Path, _environment: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Reads `<dir>/<environment>.json` when it exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileSource;

impl JsonFileSource {
    /// Location of the overlay file for a component root and environment.
    pub fn location(dir: &Path, environment: &str) -> PathBuf {
        dir.join(format!("{environment}.json"))
    }
}

impl ConfigSource for JsonFileSource {
    fn load(&self, dir: &Path, environment: &str) -> Result<Option<Value>> {
        let path = Self::location(dir, environment);
        if !path.is_file() {
            debug!(path = %path.display(), "No configuration overlay");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            SprigError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| SprigError::config(format!("Invalid JSON in {}: {e}", path.display())))?;

        debug!(path = %path.display(), "Loaded configuration overlay");
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_dotted_path() {
        let config = UserConfig::from_value(json!({"db": {"pool": {"size": 4}}}));
        assert_eq!(config.lookup("db.pool.size"), Some(&json!(4)));
        assert_eq!(config.lookup("db.missing"), None);
    }

    #[test]
    fn test_subconfig_narrows_or_empties() {
        let config = UserConfig::from_value(json!({"blog": {"title": "x"}, "flag": true}));
        assert_eq!(config.subconfig("blog").lookup_str("title"), Some("x"));
        assert_eq!(config.subconfig("flag"), UserConfig::empty());
        assert_eq!(config.subconfig("absent"), UserConfig::empty());
    }

    #[test]
    fn test_merge_overrides_leaves_and_keeps_siblings() {
        let base = UserConfig::from_value(json!({"a": {"x": 1, "y": 2}}));
        let merged = base.merged(&json!({"a": {"y": 3}, "b": true}));
        assert_eq!(merged.as_value(), &json!({"a": {"x": 1, "y": 3}, "b": true}));
        // the original handle is untouched
        assert_eq!(base.lookup("a.y"), Some(&json!(2)));
    }

    #[test]
    fn test_json_file_source_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(JsonFileSource.load(dir.path(), "devel").unwrap(), None);
    }

    #[test]
    fn test_json_file_source_reads_environment_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("devel.json"), r#"{"port": 8000}"#).unwrap();
        let loaded = JsonFileSource.load(dir.path(), "devel").unwrap();
        assert_eq!(loaded, Some(json!({"port": 8000})));
        assert_eq!(JsonFileSource.load(dir.path(), "prod").unwrap(), None);
    }

    #[test]
    fn test_json_file_source_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("devel.json"), "{").unwrap();
        let err = JsonFileSource.load(dir.path(), "devel").unwrap_err();
        assert!(matches!(err, SprigError::Config { .. }));
    }
}
