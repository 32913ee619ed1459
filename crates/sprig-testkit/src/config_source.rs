//! In-memory configuration overlays
//!
//! Clones share their state, so a test can hand one copy to the builder and
//! inspect the other afterwards.

use parking_lot::Mutex;
use serde_json::Value;
use sprig_core::{ConfigSource, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// [`ConfigSource`] backed by a map from `(dir, environment)` to overlay.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigSource {
    overlays: Arc<Mutex<HashMap<(PathBuf, String), Value>>>,
    loads: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl InMemoryConfigSource {
    /// A source with no overlays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the overlay served for `dir` in `environment`.
    pub fn with_overlay(
        self,
        dir: impl Into<PathBuf>,
        environment: impl Into<String>,
        overlay: Value,
    ) -> Self {
        self.overlays
            .lock()
            .insert((dir.into(), environment.into()), overlay);
        self
    }

    /// Every `(dir, environment)` pair asked for, in order.
    pub fn loads(&self) -> Vec<(PathBuf, String)> {
        self.loads.lock().clone()
    }
}

impl ConfigSource for InMemoryConfigSource {
    fn load(&self, dir: &Path, environment: &str) -> Result<Option<Value>> {
        let key = (dir.to_path_buf(), environment.to_string());
        self.loads.lock().push(key.clone());
        Ok(self.overlays.lock().get(&key).cloned())
    }
}
