//! Build context
//!
//! An [`Initializer`] is the context a component's construction code runs
//! in. It threads the build-wide [`InitializerState`] (route table, site
//! filters, cleanup actions, informational messages, the config being
//! assembled) and the accumulated post-init [`Hook`], and is focused on one
//! component through a view lens the same way a [`Handler`] is.
//!
//! Components are described by a [`ComponentInit`] and built with
//! [`Initializer::nest_component`]; the top-level one is built by
//! [`AppBuilder`](crate::AppBuilder).

use sprig_core::{
    build_path, Component, ComponentConfig, Composition, ConfigSource, HandlerResult,
    Hook, HookError, LivePatch, Result, ViewLens,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::handler::Handler;
use crate::live::MasterReloader;
use crate::site::{identity_filter, route, Route, RouteHandler, RouteTable, SiteFilter};

/// Action run once when the application shuts down.
pub type CleanupAction = Box<dyn FnOnce() + Send>;

/// Construction code of a `V` component inside a `B` application.
pub type InitBody<B, V> = Box<dyn FnOnce(&mut Initializer<'_, B, V>) -> Result<V>>;

/// Build-wide state threaded through every component's construction.
pub struct InitializerState<B: 'static> {
    pub(crate) is_top_level: bool,
    pub(crate) cleanup: Vec<CleanupAction>,
    pub(crate) routes: RouteTable<B>,
    pub(crate) filter: SiteFilter<B>,
    pub(crate) current_config: ComponentConfig,
    pub(crate) messages: Vec<String>,
    pub(crate) environment: String,
    pub(crate) master_reloader: MasterReloader<B>,
    pub(crate) config_source: Arc<dyn ConfigSource>,
    pub(crate) verbose: bool,
}

impl<B: 'static> fmt::Debug for InitializerState<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerState")
            .field("is_top_level", &self.is_top_level)
            .field("cleanup", &self.cleanup.len())
            .field("routes", &self.routes)
            .field("current_config", &self.current_config)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl<B: 'static> InitializerState<B> {
    /// Fresh state for building a top-level component from `root_config`.
    pub(crate) fn new(
        root_config: ComponentConfig,
        environment: impl Into<String>,
        master_reloader: MasterReloader<B>,
        config_source: Arc<dyn ConfigSource>,
        verbose: bool,
    ) -> Self {
        Self {
            is_top_level: true,
            cleanup: Vec::new(),
            routes: RouteTable::new(),
            filter: identity_filter(),
            current_config: root_config,
            messages: Vec::new(),
            environment: environment.into(),
            master_reloader,
            config_source,
            verbose,
        }
    }
}

/// Build-time context focused on a `V` component of a `B` application.
pub struct Initializer<'a, B: 'static, V: 'static> {
    state: &'a mut InitializerState<B>,
    hooks: &'a mut Hook<B>,
    lens: ViewLens<Component<B>, V>,
}

impl<B: 'static, V: 'static> fmt::Debug for Initializer<'_, B, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Initializer")
            .field("component", &self.state.current_config.id)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<'a, B: 'static> Initializer<'a, B, B> {
    /// A context focused on the top-level component.
    pub(crate) fn new(state: &'a mut InitializerState<B>, hooks: &'a mut Hook<B>) -> Self {
        Self {
            state,
            hooks,
            lens: sprig_core::Lens::identity(),
        }
    }
}

impl<'a, B: 'static, V: 'static> Initializer<'a, B, V> {
    /// Registers request handlers under this component's URL prefix.
    ///
    /// Each pattern is stored as `root_url/pattern`. When a route matches,
    /// its relative pattern is recorded on the root descriptor (unless an
    /// outer route already recorded one) and the handler runs focused on
    /// this component.
    pub fn add_routes<P, I>(&mut self, routes: I)
    where
        P: AsRef<str>,
        I: IntoIterator<Item = (P, RouteHandler<B, V>)>,
    {
        for (pattern, handler) in routes {
            let relative = pattern.as_ref().trim_matches('/').to_owned();
            let full = build_path(
                &std::iter::once(relative.as_str())
                    .chain(self.state.current_config.route_context.iter().map(String::as_str))
                    .collect::<Vec<_>>(),
            );
            let lens = self.lens.clone();
            let action = route(move |top: &mut Handler<'_, B, B>| {
                if top.route_pattern().is_none() {
                    top.set_route_pattern(relative.as_str());
                }
                top.with_top_cell(&lens, |h| handler(h))
            });
            debug!(route = %full, "Registered route");
            self.state.routes.push(full, action);
        }
    }

    /// Registers a single request handler; see [`Self::add_routes`].
    pub fn add_route<F>(&mut self, pattern: &str, handler: F)
    where
        F: Fn(&mut Handler<'_, B, V>) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.add_routes([(pattern, Arc::new(handler) as RouteHandler<B, V>)]);
    }

    /// Wraps the whole site with a filter running focused on this component.
    ///
    /// The filter receives the site as it stands when the build finishes and
    /// decides whether and how to run it (see [`Handler::run_site`]). The
    /// filter registered last ends up outermost.
    pub fn wrap_site<F>(&mut self, filter: F)
    where
        F: Fn(&mut Handler<'_, B, V>, &Route<B>) -> HandlerResult<()> + Send + Sync + 'static,
    {
        let lens = self.lens.clone();
        let filter = Arc::new(filter);
        let wrap = move |site: Route<B>| -> Route<B> {
            let lens = lens.clone();
            let filter = Arc::clone(&filter);
            route(move |top: &mut Handler<'_, B, B>| {
                top.with_top_cell(&lens, |h| filter(h, &site))
            })
        };
        let previous = std::mem::replace(&mut self.state.filter, identity_filter());
        self.state.filter = Arc::new(move |site: Route<B>| wrap(previous(site)));
    }

    /// Registers an action to run when the application shuts down.
    ///
    /// Actions run once, in registration order.
    pub fn on_unload(&mut self, action: impl FnOnce() + Send + 'static) {
        self.state.cleanup.push(Box::new(action));
    }

    /// Records an informational message, echoing it when verbose.
    pub fn print_info(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.state.verbose {
            info!(component = ?self.state.current_config.id, "{message}");
        } else {
            debug!(component = ?self.state.current_config.id, "{message}");
        }
        self.state.messages.push(message);
    }

    /// Name of the environment the application is built for.
    pub fn environment(&self) -> &str {
        &self.state.environment
    }

    /// Schedules a hook over this component's value.
    ///
    /// Hooks run once right after the build and again on every reload, in
    /// registration order.
    pub fn add_post_init_hook<F>(&mut self, hook: F)
    where
        F: Fn(&mut V) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.append(Hook::on_value(hook).lift(&self.lens));
    }

    /// Schedules a hook over this component's whole cell.
    pub fn add_post_init_hook_cell<F>(&mut self, hook: F)
    where
        F: Fn(&mut Component<V>) -> std::result::Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.append(Hook::from_fn(hook).lift(&self.lens));
    }

    /// Schedules a hook already anchored at the root cell.
    pub fn add_post_init_hook_base(&mut self, hook: Hook<B>) {
        self.hooks.append(hook);
    }

    /// Patches the live root cell.
    ///
    /// Does nothing while the application is still being built.
    pub fn modify_master(&self, patch: impl FnOnce(&mut Component<B>)) -> Result<()> {
        self.state.master_reloader.apply_once(patch)
    }

    /// Builds a nested component reachable through `lens`, mounted at `route`.
    ///
    /// The child sees a copy of this component's descriptor extended with its
    /// own name, route segment, configuration subtree and file root; this
    /// component's descriptor is restored afterwards, whether or not the
    /// child built successfully.
    pub fn nest_component<C: 'static>(
        &mut self,
        route: &str,
        lens: &ViewLens<V, C>,
        init: ComponentInit<B, C>,
    ) -> Result<Component<C>> {
        let route = route.trim_matches('/');
        self.with(lens, |child| {
            child.bracket_config(|cx| {
                cx.state.current_config.id = None;
                cx.state.current_config.push_route_segment(route);
                init.build(cx)
            })
        })
    }

    fn bracket_config<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.state.current_config.clone();
        let result = f(self);
        self.state.current_config = saved;
        result
    }

    /// Fills in the descriptor for the component named `name` before its body runs.
    fn enter_component(&mut self, name: &str, description: String) -> Result<()> {
        let state = &mut *self.state;
        let config = &mut state.current_config;
        config.id = Some(name.to_owned());
        if !state.is_top_level {
            config.user_config = config.user_config.subconfig(name);
            config.file_path = config.file_path.join("components").join(name);
        }
        state.is_top_level = false;
        config.ancestry.push(name.to_owned());
        config.description = description;

        let url = config.root_url();
        self.print_info(format!("Initializing {name} @ /{url}"));

        let (dir, environment) = (
            self.state.current_config.file_path.clone(),
            self.state.environment.clone(),
        );
        if let Some(overlay) = self.state.config_source.load(&dir, &environment)? {
            let config = &mut self.state.current_config;
            config.user_config = config.user_config.merged(&overlay);
        }
        Ok(())
    }

    /// Wraps a freshly built value into its cell.
    fn finish_component(&self, value: V) -> Component<V> {
        let lens = self.lens.clone();
        let master = self.state.master_reloader.clone();
        let live_patch: LivePatch<V> = Arc::new(move |value: V| {
            let lens = lens.clone();
            if let Err(err) = master.apply_once(move |root| lens.view_mut(root).value = value) {
                warn!(error = %err, "Live patch dropped");
            }
        });
        Component::new(self.state.current_config.clone(), live_patch, value)
    }
}

impl<'a, B: 'static, V: 'static> Composition for Initializer<'a, B, V> {
    type Root = B;
    type State = V;
    type Nested<'n, C: 'static> = Initializer<'n, B, C>
    where
        Self: 'n;

    fn zoom_cell<C: 'static>(
        &mut self,
        lens: &ViewLens<Component<V>, C>,
    ) -> Initializer<'_, B, C> {
        Initializer {
            state: &mut *self.state,
            hooks: &mut *self.hooks,
            lens: self.lens.compose(lens),
        }
    }

    fn zoom_top_cell<C: 'static>(
        &mut self,
        lens: &ViewLens<Component<B>, C>,
    ) -> Initializer<'_, B, C> {
        Initializer {
            state: &mut *self.state,
            hooks: &mut *self.hooks,
            lens: lens.clone(),
        }
    }

    /// Where the component being built will sit.
    fn self_lens(&self) -> ViewLens<Component<B>, V> {
        self.lens.clone()
    }

    /// The descriptor assembled so far for the component being built.
    fn descriptor(&self) -> &ComponentConfig {
        &self.state.current_config
    }
}

/// A component ready to be built: its identity plus its construction code.
pub struct ComponentInit<B: 'static, V: 'static> {
    id: String,
    description: String,
    name: Option<String>,
    body: InitBody<B, V>,
}

impl<B: 'static, V: 'static> fmt::Debug for ComponentInit<B, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInit")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Describes a component with default name `id`.
pub fn make_component<B, V, F>(
    id: impl Into<String>,
    description: impl Into<String>,
    body: F,
) -> ComponentInit<B, V>
where
    B: 'static,
    V: 'static,
    F: FnOnce(&mut Initializer<'_, B, V>) -> Result<V> + 'static,
{
    ComponentInit {
        id: id.into(),
        description: description.into(),
        name: None,
        body: Box::new(body),
    }
}

impl<B: 'static, V: 'static> ComponentInit<B, V> {
    /// Registers the component under `name` instead of its default id.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The component's default id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name the component will be registered under.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Runs construction in `cx`, which must already be focused on the new cell.
    pub(crate) fn build(self, cx: &mut Initializer<'_, B, V>) -> Result<Component<V>> {
        let ComponentInit {
            id,
            description,
            name,
            body,
        } = self;
        let name = name.unwrap_or(id);
        cx.enter_component(&name, description)?;
        let value = body(&mut *cx)?;
        debug!(component = %name, "Component built");
        Ok(cx.finish_component(value))
    }
}
