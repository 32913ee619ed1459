//! Application runner
//!
//! [`AppBuilder`] builds the top-level component, runs the post-init hooks
//! once, publishes the root into a [`LiveRoot`] and freezes the route table
//! and site filters into a single pipeline. [`App`] serves requests against
//! that pipeline and exposes reload and shutdown.

use once_cell::sync::OnceCell;
use sprig_core::{
    Component, ComponentConfig, ConfigSource, HandlerResult, Hook, JsonFileSource, Reloader,
    RequestEffects, Result, SprigError, UserConfig,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::handler::Handler;
use crate::initializer::{CleanupAction, ComponentInit, Initializer, InitializerState};
use crate::live::LiveRoot;
use crate::reload::{reload_site, RELOAD_ROUTE};
use crate::site::{route, Route};

/// Builds an [`App`] from its top-level component.
pub struct AppBuilder<B: 'static> {
    init: ComponentInit<B, B>,
    config: AppConfig,
    config_source: Arc<dyn ConfigSource>,
}

impl<B: 'static> fmt::Debug for AppBuilder<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBuilder")
            .field("init", &self.init)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B: Send + Sync + 'static> AppBuilder<B> {
    /// A builder with default settings, reading `<environment>.json` overlays.
    pub fn new(init: ComponentInit<B, B>) -> Self {
        Self {
            init,
            config: AppConfig::default(),
            config_source: Arc::new(JsonFileSource),
        }
    }

    /// Replaces the application settings.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces where per-component configuration overlays come from.
    pub fn config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.config_source = Arc::new(source);
        self
    }

    /// Builds the application.
    ///
    /// The builtin reload route is registered before any component route.
    /// If construction or the first run of the post-init hooks fails, the
    /// cleanup actions registered so far are run and the error is returned.
    pub fn build(self) -> Result<App<B>> {
        let AppBuilder {
            init,
            config,
            config_source,
        } = self;
        config.validate()?;
        info!(
            environment = %config.environment,
            base_dir = %config.base_dir.display(),
            "Building application"
        );

        let live = LiveRoot::new();
        let hook_cell = Arc::new(OnceCell::new());
        let root_config = ComponentConfig::new(
            config.base_dir.clone(),
            UserConfig::empty(),
            make_reloader(&live, &hook_cell),
        );
        let mut state = InitializerState::new(
            root_config,
            config.environment.clone(),
            live.master_reloader(),
            config_source,
            config.verbose,
        );
        state.routes.push(RELOAD_ROUTE, route(reload_site::<B, B>));

        let mut hooks = Hook::identity();
        let built = {
            let mut cx = Initializer::new(&mut state, &mut hooks);
            init.build(&mut cx)
        };
        let built = built.and_then(|mut root| {
            hooks.run(&mut root)?;
            Ok(root)
        });
        let root = match built {
            Ok(root) => root,
            Err(err) => {
                warn!(error = %err, "Application build failed");
                run_cleanup(&mut state.cleanup);
                return Err(err);
            }
        };
        debug!(hooks = hooks.len(), "Post-init hooks ran");

        if hook_cell.set(hooks).is_err() {
            return Err(SprigError::internal("post-init hooks installed twice"));
        }
        live.install(root)?;

        let InitializerState {
            routes,
            filter,
            cleanup,
            messages,
            ..
        } = state;
        let patterns: Vec<String> = routes.patterns().map(str::to_owned).collect();
        let site = filter(routes.into_dispatcher());
        info!(routes = patterns.len(), "Application ready");

        Ok(App {
            live,
            site,
            patterns,
            messages,
            cleanup,
        })
    }
}

/// The root reloader: re-runs the composed post-init hook on the live root.
fn make_reloader<B: Send + Sync + 'static>(
    live: &LiveRoot<B>,
    hooks: &Arc<OnceCell<Hook<B>>>,
) -> Reloader {
    let live = live.downgrade();
    let hooks = Arc::clone(hooks);
    Arc::new(move || {
        let hook = hooks
            .get()
            .ok_or_else(|| "application is still initializing".to_string())?;
        let live = live
            .upgrade()
            .ok_or_else(|| "application is not running".to_string())?;
        match live.modify(|root| hook.run(root)) {
            Err(err) => Err(err.to_string()),
            Ok(None) => Err("application is not running".to_string()),
            Ok(Some(Err(err))) => {
                warn!(error = %err, "Post-init hook failed during reload");
                Err(err.message().to_string())
            }
            Ok(Some(Ok(()))) => {
                info!(hooks = hook.len(), "Post-init hooks re-ran");
                Ok(format!("Re-ran {} post-init hook(s)\n", hook.len()))
            }
        }
    })
}

fn run_cleanup(actions: &mut Vec<CleanupAction>) {
    for (index, action) in actions.drain(..).enumerate() {
        debug!(index, "Running cleanup action");
        action();
    }
}

/// A built, running application.
pub struct App<B: 'static> {
    live: LiveRoot<B>,
    site: Route<B>,
    patterns: Vec<String>,
    messages: Vec<String>,
    cleanup: Vec<CleanupAction>,
}

impl<B: 'static> fmt::Debug for App<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("live", &self.live)
            .field("routes", &self.patterns)
            .field("cleanup", &self.cleanup.len())
            .finish_non_exhaustive()
    }
}

impl<B: Send + Sync + 'static> App<B> {
    /// Serves one request.
    ///
    /// The request runs against a private snapshot of the live root, which
    /// is discarded afterwards: state written by a handler is visible to the
    /// rest of that request only. Durable changes go through live patches
    /// or the master reloader.
    pub fn serve(&self, io: &mut dyn RequestEffects) -> HandlerResult<()>
    where
        B: Clone,
    {
        let mut root = self
            .live
            .snapshot()
            .ok_or_else(|| SprigError::internal("application is not running"))?;
        root.config.route_pattern = None;
        debug!(path = %io.request().path, "Serving request");
        (self.site)(&mut Handler::new(&mut root, io))
    }

    /// Re-runs every post-init hook against the live root.
    pub fn reload(&self) -> std::result::Result<String, String> {
        let reloader = self
            .live
            .read(|root| root.config.reloader.clone())
            .ok_or_else(|| "application is not running".to_string())?;
        reloader()
    }

    /// Informational messages recorded while building, in order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Full route patterns in dispatch order.
    pub fn routes(&self) -> &[String] {
        &self.patterns
    }

    /// A private copy of the live root.
    pub fn snapshot(&self) -> Option<Component<B>>
    where
        B: Clone,
    {
        self.live.snapshot()
    }

    /// Reads the live root in place.
    pub fn read<R>(&self, f: impl FnOnce(&Component<B>) -> R) -> Option<R> {
        self.live.read(f)
    }

    /// Runs the cleanup actions, in registration order, and stops the application.
    pub fn shutdown(mut self) {
        info!("Shutting down");
        run_cleanup(&mut self.cleanup);
    }
}

impl<B: 'static> Drop for App<B> {
    fn drop(&mut self) {
        run_cleanup(&mut self.cleanup);
    }
}
