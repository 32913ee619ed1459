//! Route table and site pipeline
//!
//! Routes registered while building are stored with their full path and a
//! root-level action. At the end of the build the table is folded into a
//! single dispatcher and wrapped by the accumulated site filters.

use sprig_core::{HandlerError, HandlerResult};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::handler::Handler;

/// A request computation running at the application root.
pub type Route<B> = Arc<dyn Fn(&mut Handler<'_, B, B>) -> HandlerResult<()> + Send + Sync>;

/// A request computation running at a `V` component.
pub type RouteHandler<B, V> =
    Arc<dyn Fn(&mut Handler<'_, B, V>) -> HandlerResult<()> + Send + Sync>;

/// Transformer applied to the whole site once the build finishes.
pub type SiteFilter<B> = Arc<dyn Fn(Route<B>) -> Route<B> + Send + Sync>;

/// Boxes a root-level request computation.
pub fn route<B, F>(f: F) -> Route<B>
where
    B: 'static,
    F: Fn(&mut Handler<'_, B, B>) -> HandlerResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Boxes a component-level request computation.
pub fn route_handler<B, V, F>(f: F) -> RouteHandler<B, V>
where
    B: 'static,
    V: 'static,
    F: Fn(&mut Handler<'_, B, V>) -> HandlerResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The filter that leaves the site unchanged.
pub fn identity_filter<B: 'static>() -> SiteFilter<B> {
    Arc::new(|site: Route<B>| site)
}

/// Strips leading and trailing `/` from a request path or route pattern.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

struct RouteEntry<B: 'static> {
    pattern: String,
    action: Route<B>,
}

/// Routes in registration order.
pub struct RouteTable<B: 'static> {
    entries: Vec<RouteEntry<B>>,
}

impl<B: 'static> Default for RouteTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: 'static> fmt::Debug for RouteTable<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

impl<B: 'static> RouteTable<B> {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a route; earlier routes take precedence.
    pub fn push(&mut self, pattern: impl Into<String>, action: Route<B>) {
        let pattern = pattern.into();
        trace!(route = %pattern, "Route added to table");
        self.entries.push(RouteEntry { pattern, action });
    }

    /// Full patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.pattern.as_str())
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no route has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Folds the table into one root-level dispatcher.
    ///
    /// The request path is matched exactly, ignoring surrounding `/`. Routes
    /// that decline fall through to the next match, with the root route
    /// pattern reset to what it was before the declined route ran; when
    /// nothing handles the request the dispatcher declines too.
    pub fn into_dispatcher(self) -> Route<B> {
        let entries = Arc::new(self.entries);
        route(move |h| {
            let path = normalize_path(&h.request().path).to_owned();
            for entry in entries.iter().filter(|entry| entry.pattern == path) {
                let pattern = h.cell().config.route_pattern.clone();
                match (entry.action)(&mut *h) {
                    Err(HandlerError::NotHandled) => {
                        trace!(route = %entry.pattern, "Route declined, trying next");
                        h.cell_mut().config.route_pattern = pattern;
                    }
                    outcome => return outcome,
                }
            }
            Err(HandlerError::NotHandled)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::{Component, ComponentConfig, Request, RequestEffects, SprigError};

    struct Io {
        request: Request,
        body: String,
    }

    impl RequestEffects for Io {
        fn request(&self) -> &Request {
            &self.request
        }

        fn write_output(&mut self, text: &str) {
            self.body.push_str(text);
        }

        fn set_response_status(&mut self, _status: u16, _reason: &str) {}
    }

    fn dispatch(site: &Route<()>, path: &str) -> (HandlerResult<()>, String) {
        let mut root = Component::detached(ComponentConfig::detached("."), ());
        let mut io = Io {
            request: Request::new("127.0.0.1", path),
            body: String::new(),
        };
        let outcome = site(&mut Handler::new(&mut root, &mut io));
        (outcome, io.body)
    }

    fn writes(text: &'static str) -> Route<()> {
        route(move |h| {
            h.write_output(text);
            Ok(())
        })
    }

    #[test]
    fn test_exact_match_ignoring_slashes() {
        let mut table = RouteTable::new();
        table.push("blog/post", writes("post"));
        let site = table.into_dispatcher();

        assert_eq!(dispatch(&site, "/blog/post/"), (Ok(()), "post".into()));
        assert_eq!(dispatch(&site, "/blog").0, Err(HandlerError::NotHandled));
        assert_eq!(dispatch(&site, "/blog/post/extra").0, Err(HandlerError::NotHandled));
    }

    #[test]
    fn test_declined_route_falls_through() {
        let mut table = RouteTable::new();
        table.push("x", route(|h| h.not_handled()));
        table.push("x", writes("second"));
        table.push("x", writes("third"));
        assert_eq!(dispatch(&table.into_dispatcher(), "x"), (Ok(()), "second".into()));
    }

    #[test]
    fn test_declined_route_leaves_no_pattern_behind() {
        let mut table = RouteTable::new();
        table.push(
            "x",
            route(|h| {
                h.set_route_pattern("first");
                h.not_handled()
            }),
        );
        table.push(
            "x",
            route(|h| {
                let pattern = h.route_pattern().unwrap_or_else(|| "none".into());
                h.write_output(&pattern);
                Ok(())
            }),
        );
        assert_eq!(dispatch(&table.into_dispatcher(), "x"), (Ok(()), "none".into()));
    }

    #[test]
    fn test_failure_stops_dispatch() {
        let mut table = RouteTable::new();
        table.push("x", route(|_| Err(SprigError::internal("db down").into())));
        table.push("x", writes("unreached"));
        let (outcome, body) = dispatch(&table.into_dispatcher(), "x");
        assert!(matches!(outcome, Err(HandlerError::Failed(_))));
        assert!(body.is_empty());
    }

    #[test]
    fn test_patterns_keep_registration_order() {
        let mut table = RouteTable::<()>::new();
        table.push("b", writes("b"));
        table.push("a", writes("a"));
        assert_eq!(table.patterns().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_identity_filter_is_transparent() {
        let mut table = RouteTable::new();
        table.push("", writes("index"));
        let site = identity_filter()(table.into_dispatcher());
        assert_eq!(dispatch(&site, "/"), (Ok(()), "index".into()));
    }
}
