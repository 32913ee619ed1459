//! # Sprig Runtime - Layer 2: Contexts and Application Lifecycle
//!
//! The two contexts component code runs in, and the machinery that builds
//! and serves a component tree:
//!
//! - [`Initializer`]: build-time context; registers routes, site filters,
//!   cleanup actions and post-init hooks, and nests child components
//! - [`Handler`]: request-time context; reads and writes component state and
//!   talks to the HTTP collaborator through [`sprig_core::RequestEffects`]
//! - [`AppBuilder`] / [`App`]: build once, serve many requests, reload, shut down
//! - [`LiveRoot`] / [`MasterReloader`]: the published root and the capability
//!   to patch it
//!
//! Both contexts implement [`sprig_core::Composition`], so code written
//! against the capability works in either. Narrowing (`with`, `with_top`)
//! and the descriptor come from that trait; bring it into scope with
//! [`prelude`].

pub mod app;
pub mod config;
pub mod handler;
pub mod initializer;
pub mod live;
pub mod reload;
pub mod site;

pub use app::{App, AppBuilder};
pub use config::AppConfig;
pub use handler::Handler;
pub use initializer::{make_component, CleanupAction, ComponentInit, InitBody, Initializer};
pub use live::{LiveRoot, MasterReloader, RootPatch};
pub use reload::{fail_if_not_local, reload_site, RELOAD_ROUTE};
pub use site::{route, route_handler, Route, RouteHandler, SiteFilter};

/// Re-export of the component model for convenience.
pub use sprig_core;

/// The names component code reaches for, including the [`Composition`]
/// trait that carries `with`, `with_top` and `descriptor`.
///
/// [`Composition`]: sprig_core::Composition
pub mod prelude {
    pub use crate::{make_component, route, route_handler, App, AppBuilder, Handler, Initializer};
    pub use sprig_core::{
        component_url, lens, root_url, Component, Composition, HandlerError, HandlerResult,
        ViewLens,
    };
}
