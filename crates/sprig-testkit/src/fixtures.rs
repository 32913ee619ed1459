//! Fixture application
//!
//! A small three-level component tree used across the integration tests:
//!
//! ```text
//! site                  /
//! ├── counter           /counter
//! └── blog              /blog
//!     └── comments      /blog/comments
//! ```
//!
//! Every component registers routes and a cleanup action; `comments` also
//! registers a post-init hook and `site` wraps the whole site. Side effects
//! that outlive the application are recorded in an [`EventLog`].

use parking_lot::Mutex;
use sprig_core::{component_url, lens, Component, Composition, Result, ViewLens};
use sprig_runtime::{make_component, App, AppBuilder, AppConfig, ComponentInit, Initializer};
use std::sync::Arc;

use crate::config_source::InMemoryConfigSource;

/// Ordered record of fixture side effects.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// A fresh, empty event log.
pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(events: &EventLog, event: &str) {
    events.lock().push(event.to_string());
}

/// State of the `counter` component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    /// Hits recorded through the `hit` route.
    pub hits: u32,
}

/// State of the `comments` component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comments {
    /// Bumped by the post-init hook on every run.
    pub count: u32,
}

/// State of the `blog` component.
#[derive(Debug, Clone)]
pub struct Blog {
    /// Read from the component's `title` config key.
    pub title: String,
    /// Nested `comments` component.
    pub comments: Component<Comments>,
}

/// State of the top-level `site` component.
#[derive(Debug, Clone)]
pub struct Site {
    /// Read from the top-level `name` config key.
    pub name: String,
    /// Nested `counter` component.
    pub counter: Component<Counter>,
    /// Nested `blog` component.
    pub blog: Component<Blog>,
}

/// `site -> counter`
pub fn counter_lens() -> ViewLens<Site, Counter> {
    lens!(Site => counter)
}

/// `site -> blog`
pub fn blog_lens() -> ViewLens<Site, Blog> {
    lens!(Site => blog)
}

/// `blog -> comments`
pub fn comments_lens() -> ViewLens<Blog, Comments> {
    lens!(Blog => comments)
}

/// Routes: `hit` (increments, prints `hits=N`), `show`, `pattern`.
pub fn counter_component(events: EventLog) -> ComponentInit<Site, Counter> {
    make_component(
        "counter",
        "Counts hits",
        move |cx: &mut Initializer<'_, Site, Counter>| {
            cx.add_route("hit", |h| {
                let hits = h.modify(|c| {
                    c.hits += 1;
                    c.hits
                });
                h.write_output(&format!("hits={hits}"));
                Ok(())
            });
            cx.add_route("show", |h| {
                let hits = h.get().hits;
                h.write_output(&hits.to_string());
                Ok(())
            });
            cx.add_route("pattern", |h| {
                let pattern = h.route_pattern().unwrap_or_default();
                h.write_output(&pattern);
                Ok(())
            });
            cx.on_unload(move || record(&events, "unload:counter"));
            Ok(Counter { hits: 0 })
        },
    )
}

/// Routes: `count`. Hook: increments `count` on every run.
pub fn comments_component(events: EventLog) -> ComponentInit<Site, Comments> {
    make_component(
        "comments",
        "Comment counts",
        move |cx: &mut Initializer<'_, Site, Comments>| {
            cx.add_route("count", |h| {
                let count = h.get().count;
                h.write_output(&count.to_string());
                Ok(())
            });
            let log = Arc::clone(&events);
            cx.add_post_init_hook(move |c: &mut Comments| {
                c.count += 1;
                record(&log, "hook:comments");
                Ok(())
            });
            cx.on_unload(move || record(&events, "unload:comments"));
            Ok(Comments { count: 0 })
        },
    )
}

/// Routes: index (prints the title), `url`. Title comes from config key `title`.
pub fn blog_component(events: EventLog) -> ComponentInit<Site, Blog> {
    make_component(
        "blog",
        "A blog",
        move |cx: &mut Initializer<'_, Site, Blog>| {
            let title = cx
                .descriptor()
                .user_config
                .lookup_str("title")
                .unwrap_or("Untitled")
                .to_string();
            let comments = cx.nest_component(
                "comments",
                &comments_lens(),
                comments_component(Arc::clone(&events)),
            )?;
            cx.add_route("", |h| {
                let title = h.get().title.clone();
                h.write_output(&title);
                Ok(())
            });
            cx.add_route("url", |h| {
                let url = component_url(&*h, "/post/1/");
                h.write_output(&url);
                Ok(())
            });
            cx.on_unload(move || record(&events, "unload:blog"));
            Ok(Blog { title, comments })
        },
    )
}

/// The whole tree. Routes: index (prints the site name). Wraps the site
/// with a filter that records `filter` before dispatching.
pub fn site_component(events: EventLog) -> ComponentInit<Site, Site> {
    make_component(
        "site",
        "Fixture site",
        move |cx: &mut Initializer<'_, Site, Site>| {
            let name = cx
                .descriptor()
                .user_config
                .lookup_str("name")
                .unwrap_or("fixture")
                .to_string();
            let counter = cx.nest_component(
                "counter",
                &counter_lens(),
                counter_component(Arc::clone(&events)),
            )?;
            let blog = cx.nest_component(
                "/blog/",
                &blog_lens(),
                blog_component(Arc::clone(&events)),
            )?;
            cx.add_route("", |h| {
                let name = h.get().name.clone();
                h.write_output(&name);
                Ok(())
            });
            let log = Arc::clone(&events);
            cx.wrap_site(move |h, site| {
                record(&log, "filter");
                h.run_site(site)
            });
            cx.on_unload(move || record(&events, "unload:site"));
            Ok(Site {
                name,
                counter,
                blog,
            })
        },
    )
}

/// Settings for fixture builds: quiet, environment `test`.
pub fn fixture_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        verbose: false,
        ..AppConfig::default()
    }
}

/// Builds the fixture application against `source`.
pub fn build_site(events: EventLog, source: InMemoryConfigSource) -> Result<App<Site>> {
    AppBuilder::new(site_component(events))
        .config(fixture_config())
        .config_source(source)
        .build()
}
