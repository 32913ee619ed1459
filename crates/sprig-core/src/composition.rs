//! Composition capability
//!
//! Both computation contexts (request handling and initialization) can be
//! narrowed from their own component to a nested one, or re-anchored at the
//! application root and narrowed from there. This module defines that
//! shared capability and the read-only helpers derived from a context's
//! descriptor.
//!
//! Narrowing is expressed as a reborrow: [`Composition::zoom_cell`] hands out
//! a nested context that borrows the current one, so whatever the nested
//! context writes lands in the parent's slot before control returns to the
//! caller.

use crate::component::{build_path, Component, ComponentConfig};
use crate::config::UserConfig;
use crate::lens::{sub_view, ViewLens};
use std::path::Path;

/// Capability shared by the request and build contexts.
pub trait Composition {
    /// State type of the application root.
    type Root: 'static;
    /// State type of the component this context is focused on.
    type State: 'static;
    /// The same kind of context, focused on a `C` component.
    type Nested<'n, C: 'static>: Composition<Root = Self::Root, State = C>
    where
        Self: 'n;

    /// Narrows to the cell reachable from this component's cell via `lens`.
    fn zoom_cell<C: 'static>(
        &mut self,
        lens: &ViewLens<Component<Self::State>, C>,
    ) -> Self::Nested<'_, C>;

    /// Narrows to the cell reachable from the root cell via `lens`.
    fn zoom_top_cell<C: 'static>(
        &mut self,
        lens: &ViewLens<Component<Self::Root>, C>,
    ) -> Self::Nested<'_, C>;

    /// This context's position in the tree, anchored at the root cell.
    fn self_lens(&self) -> ViewLens<Component<Self::Root>, Self::State>;

    /// This component's descriptor.
    fn descriptor(&self) -> &ComponentConfig;

    /// Runs `f` focused on the cell reachable from this component's cell.
    fn with_cell<'s, C, R, F>(
        &'s mut self,
        lens: &ViewLens<Component<Self::State>, C>,
        f: F,
    ) -> R
    where
        C: 'static,
        F: FnOnce(&mut Self::Nested<'s, C>) -> R,
    {
        f(&mut self.zoom_cell(lens))
    }

    /// Runs `f` focused on the cell reachable from the root cell.
    fn with_top_cell<'s, C, R, F>(
        &'s mut self,
        lens: &ViewLens<Component<Self::Root>, C>,
        f: F,
    ) -> R
    where
        C: 'static,
        F: FnOnce(&mut Self::Nested<'s, C>) -> R,
    {
        f(&mut self.zoom_top_cell(lens))
    }

    /// Runs `f` focused on a component nested in this component's state.
    fn with<'s, C, R, F>(&'s mut self, lens: &ViewLens<Self::State, C>, f: F) -> R
    where
        C: 'static,
        F: FnOnce(&mut Self::Nested<'s, C>) -> R,
    {
        self.with_cell(&sub_view(lens), f)
    }

    /// Runs `f` focused on a component nested in the root state.
    fn with_top<'s, C, R, F>(&'s mut self, lens: &ViewLens<Self::Root, C>, f: F) -> R
    where
        C: 'static,
        F: FnOnce(&mut Self::Nested<'s, C>) -> R,
    {
        self.with_top_cell(&sub_view(lens), f)
    }
}

/// Root-to-self path of component names.
pub fn ancestry<X: Composition + ?Sized>(cx: &X) -> &[String] {
    &cx.descriptor().ancestry
}

/// The component's private filesystem root.
pub fn file_path<X: Composition + ?Sized>(cx: &X) -> &Path {
    &cx.descriptor().file_path
}

/// The name the component is registered under.
pub fn component_name<X: Composition + ?Sized>(cx: &X) -> Option<&str> {
    cx.descriptor().id.as_deref()
}

/// The component's description.
pub fn description<X: Composition + ?Sized>(cx: &X) -> &str {
    &cx.descriptor().description
}

/// The component's user configuration.
pub fn user_config<X: Composition + ?Sized>(cx: &X) -> &UserConfig {
    &cx.descriptor().user_config
}

/// The URL prefix the component answers under.
pub fn root_url<X: Composition + ?Sized>(cx: &X) -> String {
    cx.descriptor().root_url()
}

/// A URL relative to the component's root.
///
/// Leading and trailing `/` are stripped from `suffix` before joining.
pub fn component_url<X: Composition + ?Sized>(cx: &X, suffix: &str) -> String {
    relative_url(&cx.descriptor().route_context, suffix)
}

fn relative_url(route_context: &[String], suffix: &str) -> String {
    let suffix = suffix.trim_matches('/');
    let segments: Vec<&str> = std::iter::once(suffix)
        .chain(route_context.iter().map(String::as_str))
        .collect();
    build_path(&segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::Lens;

    /// Descriptor-only context used to exercise the derived helpers.
    struct Detached<S: 'static> {
        config: ComponentConfig,
        lens: ViewLens<Component<()>, S>,
    }

    impl<S: 'static> Composition for Detached<S> {
        type Root = ();
        type State = S;
        type Nested<'n, C: 'static> = Detached<C>
        where
            Self: 'n;

        fn zoom_cell<C: 'static>(&mut self, lens: &ViewLens<Component<S>, C>) -> Detached<C> {
            Detached {
                config: self.config.clone(),
                lens: self.lens.compose(lens),
            }
        }

        fn zoom_top_cell<C: 'static>(&mut self, lens: &ViewLens<Component<()>, C>) -> Detached<C> {
            Detached {
                config: self.config.clone(),
                lens: lens.clone(),
            }
        }

        fn self_lens(&self) -> ViewLens<Component<()>, S> {
            self.lens.clone()
        }

        fn descriptor(&self) -> &ComponentConfig {
            &self.config
        }
    }

    fn detached(route_context: &[&str]) -> Detached<()> {
        let mut config = ComponentConfig::detached("site/components/blog");
        config.ancestry = vec!["app".into(), "blog".into()];
        config.id = Some("blog".into());
        config.description = "A blog".into();
        config.route_context = route_context.iter().map(|s| s.to_string()).collect();
        Detached {
            config,
            lens: Lens::identity(),
        }
    }

    #[test]
    fn test_descriptor_helpers() {
        let p = detached(&["blog", "app"]);
        assert_eq!(ancestry(&p), ["app", "blog"]);
        assert_eq!(file_path(&p), Path::new("site/components/blog"));
        assert_eq!(component_name(&p), Some("blog"));
        assert_eq!(description(&p), "A blog");
        assert_eq!(user_config(&p), &UserConfig::empty());
        assert_eq!(root_url(&p), "app/blog");
    }

    #[test]
    fn test_component_url_strips_separators() {
        let p = detached(&["app"]);
        assert_eq!(component_url(&p, "/foo/"), "app/foo");
        assert_eq!(component_url(&p, "foo"), "app/foo");
        assert_eq!(component_url(&p, "//a/b//"), "app/a/b");
    }

    #[test]
    fn test_component_url_at_root() {
        let p = detached(&[]);
        assert_eq!(component_url(&p, "/login"), "login");
        assert_eq!(component_url(&p, "/"), "");
    }
}
