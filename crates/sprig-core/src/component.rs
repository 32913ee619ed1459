//! Component descriptors and component cells
//!
//! A [`ComponentConfig`] is the bookkeeping record built incrementally while a
//! component is initialized: where it sits in the tree, where its files
//! live, what URL prefix it answers under. Once the component is built the
//! record is frozen into the [`Component`] cell that wraps its state value.

use crate::config::UserConfig;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Whole-application reload trigger.
///
/// Always bound to the root component's composed hook; see `sprig-runtime`.
pub type Reloader = Arc<dyn Fn() -> Result<String, String> + Send + Sync>;

/// Overwrites an already-live component value without re-running construction.
pub type LivePatch<S> = Arc<dyn Fn(S) + Send + Sync>;

/// Per-component metadata.
#[derive(Clone)]
pub struct ComponentConfig {
    /// Root-to-self path of component names.
    pub ancestry: Vec<String>,
    /// The component's private filesystem root.
    pub file_path: PathBuf,
    /// Name the component is registered under.
    pub id: Option<String>,
    /// Human readable description.
    pub description: String,
    /// Component-scoped user configuration.
    pub user_config: UserConfig,
    /// Route segments contributed by each ancestor, innermost first.
    pub route_context: Vec<String>,
    /// Pattern of the route currently being dispatched, if any.
    pub route_pattern: Option<String>,
    /// Whole-application reload trigger.
    pub reloader: Reloader,
}

impl ComponentConfig {
    /// Creates the descriptor for a top-level component rooted at `file_path`.
    pub fn new(file_path: impl Into<PathBuf>, user_config: UserConfig, reloader: Reloader) -> Self {
        Self {
            ancestry: Vec::new(),
            file_path: file_path.into(),
            id: None,
            description: String::new(),
            user_config,
            route_context: Vec::new(),
            route_pattern: None,
            reloader,
        }
    }

    /// Descriptor whose reloader always reports that reloading is unavailable.
    pub fn detached(file_path: impl Into<PathBuf>) -> Self {
        Self::new(
            file_path,
            UserConfig::empty(),
            Arc::new(|| Err("reloading is not available for a detached component".to_string())),
        )
    }

    /// Root URL of the component: the route context joined with `/`.
    pub fn root_url(&self) -> String {
        build_path(&self.route_context)
    }

    /// Prepends a route segment; empty segments are ignored.
    pub fn push_route_segment(&mut self, segment: impl Into<String>) {
        let segment = segment.into();
        if !segment.is_empty() {
            self.route_context.insert(0, segment);
        }
    }
}

impl fmt::Debug for ComponentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentConfig")
            .field("ancestry", &self.ancestry)
            .field("file_path", &self.file_path)
            .field("id", &self.id)
            .field("description", &self.description)
            .field("route_context", &self.route_context)
            .field("route_pattern", &self.route_pattern)
            .finish_non_exhaustive()
    }
}

/// Joins route segments stored innermost first into a URL path.
///
/// Segments are reversed, empty segments are dropped, and the rest are
/// joined with `/`: `["", "b", "a"]` becomes `"a/b"`.
pub fn build_path<S: AsRef<str>>(route_context: &[S]) -> String {
    route_context
        .iter()
        .rev()
        .map(AsRef::as_ref)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A component's state value together with its descriptor.
pub struct Component<S> {
    /// Descriptor frozen at build time.
    pub config: ComponentConfig,
    /// Writes a value into the live application at this component's position.
    ///
    /// Only meaningful for the build step that produced the cell.
    pub live_patch: LivePatch<S>,
    /// The component's state.
    pub value: S,
}

impl<S> Component<S> {
    /// Wraps `value` with its descriptor and live-patch capability.
    pub fn new(config: ComponentConfig, live_patch: LivePatch<S>, value: S) -> Self {
        Self {
            config,
            live_patch,
            value,
        }
    }

    /// Wraps `value` with a descriptor and a live-patch that does nothing.
    pub fn detached(config: ComponentConfig, value: S) -> Self {
        Self::new(config, Arc::new(|_| {}), value)
    }

    /// The component's state value.
    pub fn value(&self) -> &S {
        &self.value
    }

    /// The component's descriptor.
    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Writes `value` into the live application, bypassing construction.
    pub fn patch_live(&self, value: S) {
        (self.live_patch)(value);
    }
}

// derive(Clone) would also require a Clone bound on the live-patch closure's argument
impl<S: Clone> Clone for Component<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            live_patch: Arc::clone(&self.live_patch),
            value: self.value.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Component<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("config", &self.config)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

// Cells compare by value and descriptor identity, not by their closures.
impl<S: PartialEq> PartialEq for Component<S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.config.id == other.config.id
            && self.config.ancestry == other.config.ancestry
            && self.config.route_context == other.config.route_context
            && self.config.route_pattern == other.config.route_pattern
    }
}
