//! # Sprig Core - Layer 1: Component State Composition
//!
//! Building blocks for assembling an application out of nested components,
//! each owning a private slice of the application state, a configuration
//! namespace, a URL prefix and a filesystem root.
//!
//! - [`Lens`] / [`ViewLens`]: navigate from a parent state type to a nested component
//! - [`Component`] / [`ComponentConfig`]: a component's state plus its descriptor
//! - [`Hook`]: composable, short-circuiting in-place patches used for live reload
//! - [`Composition`]: the capability shared by the request and build contexts
//! - [`RequestEffects`]: the narrow contract offered by the HTTP collaborator
//!
//! The contexts themselves live in `sprig-runtime`.

pub mod component;
pub mod composition;
pub mod config;
pub mod effects;
pub mod errors;
pub mod hook;
pub mod lens;

pub use component::{build_path, Component, ComponentConfig, LivePatch, Reloader};
pub use composition::{
    ancestry, component_name, component_url, description, file_path, root_url, user_config,
    Composition,
};
pub use config::{merge_json_values, ConfigSource, JsonFileSource, NullSource, UserConfig};
pub use effects::{is_localhost, Request, RequestEffects, LOOPBACK_ADDRS};
pub use errors::{HandlerError, HandlerResult, HookError, Result, SprigError};
pub use hook::{Hook, HookFn};
pub use lens::{config_lens, sub_view, value_lens, Lens, ViewFn, ViewLens, ViewMutFn};
