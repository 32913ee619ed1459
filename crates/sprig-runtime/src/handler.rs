//! Request context
//!
//! A [`Handler`] is the context request code runs in. It borrows the root
//! cell of the application (a per-request snapshot, see [`crate::App`]) and
//! the request I/O, and is focused on one component through a view lens.
//! Narrowing to a nested component reborrows both, so every write a nested
//! handler makes is already in the parent's cell when it returns, whatever
//! it returned.

use sprig_core::{
    Component, ComponentConfig, Composition, HandlerError, HandlerResult, Lens, Request,
    RequestEffects, SprigError, ViewLens,
};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::trace;

use crate::site::Route;

/// Request-time context focused on a `V` component of a `B` application.
pub struct Handler<'a, B: 'static, V: 'static> {
    root: &'a mut Component<B>,
    lens: ViewLens<Component<B>, V>,
    io: &'a mut dyn RequestEffects,
}

impl<B: 'static, V: 'static> fmt::Debug for Handler<'_, B, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("component", &self.descriptor().id)
            .field("request", self.io.request())
            .finish_non_exhaustive()
    }
}

impl<'a, B: 'static> Handler<'a, B, B> {
    /// A handler focused on the root component.
    pub fn new(root: &'a mut Component<B>, io: &'a mut dyn RequestEffects) -> Self {
        Self {
            root,
            lens: Lens::identity(),
            io,
        }
    }
}

impl<'a, B: 'static, V: 'static> Handler<'a, B, V> {
    /// The cell this handler is focused on.
    pub fn cell(&self) -> &Component<V> {
        self.lens.view(&*self.root)
    }

    /// Exclusive access to the focused cell.
    pub fn cell_mut(&mut self) -> &mut Component<V> {
        self.lens.view_mut(&mut *self.root)
    }

    /// The component's state.
    pub fn get(&self) -> &V {
        &self.cell().value
    }

    /// Exclusive access to the component's state.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.cell_mut().value
    }

    /// Projects out of the component's state.
    pub fn gets<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(self.get())
    }

    /// Replaces the component's state.
    pub fn put(&mut self, value: V) {
        self.cell_mut().value = value;
    }

    /// Updates the component's state in place.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut V) -> R) -> R {
        f(self.get_mut())
    }

    /// Runs `f` with the state temporarily replaced by `value`.
    ///
    /// The previous state is restored afterwards, also when `f` unwinds;
    /// whatever `f` did to the temporary value is discarded.
    pub fn with_local<R>(&mut self, value: V, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(self.get_mut(), value);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut *self)));
        *self.get_mut() = saved;
        outcome.unwrap_or_else(|payload| panic::resume_unwind(payload))
    }

    /// The request being processed.
    pub fn request(&self) -> &Request {
        self.io.request()
    }

    /// Appends text to the response body.
    pub fn write_output(&mut self, text: &str) {
        self.io.write_output(text);
    }

    /// Sets the response status line.
    pub fn set_response_status(&mut self, status: u16, reason: &str) {
        self.io.set_response_status(status, reason);
    }

    /// Declines the current request.
    pub fn not_handled<T>(&self) -> HandlerResult<T> {
        trace!(path = %self.request().path, "Request not handled");
        Err(HandlerError::NotHandled)
    }

    /// Pattern of the route being dispatched, read from the root descriptor.
    pub fn route_pattern(&mut self) -> Option<String> {
        self.with_top_cell(&Lens::identity(), |top| {
            top.descriptor().route_pattern.clone()
        })
    }

    /// Records the pattern of the route being dispatched on the root descriptor.
    pub fn set_route_pattern(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        self.with_top_cell(&Lens::identity(), |top| {
            top.cell_mut().config.route_pattern = Some(pattern);
        });
    }

    /// Runs a whole-site route from the root, whatever this handler is focused on.
    pub fn run_site(&mut self, site: &Route<B>) -> HandlerResult<()> {
        self.with_top_cell(&Lens::identity(), |top| site(top))
    }

    /// Acquire, use, release.
    ///
    /// `release` runs exactly once after `acquire` succeeded, however `body`
    /// exits: with a value, with [`HandlerError::NotHandled`], with a failure,
    /// or by unwinding. If `acquire` fails nothing is released.
    pub fn bracket<A, T>(
        &mut self,
        acquire: impl FnOnce(&mut Self) -> HandlerResult<A>,
        release: impl FnOnce(A),
        body: impl FnOnce(&mut Self, &mut A) -> HandlerResult<T>,
    ) -> HandlerResult<T> {
        let resource = acquire(&mut *self)?;
        let mut guard = ReleaseGuard {
            resource: Some(resource),
            release: Some(release),
        };
        let Some(resource) = guard.resource.as_mut() else {
            return Err(SprigError::internal("bracketed resource missing").into());
        };
        body(self, resource)
    }
}

/// Hands the resource to the release action when dropped.
struct ReleaseGuard<A, F: FnOnce(A)> {
    resource: Option<A>,
    release: Option<F>,
}

impl<A, F: FnOnce(A)> Drop for ReleaseGuard<A, F> {
    fn drop(&mut self) {
        if let (Some(resource), Some(release)) = (self.resource.take(), self.release.take()) {
            release(resource);
        }
    }
}

impl<'a, B: 'static, V: 'static> Composition for Handler<'a, B, V> {
    type Root = B;
    type State = V;
    type Nested<'n, C: 'static> = Handler<'n, B, C>
    where
        Self: 'n;

    fn zoom_cell<C: 'static>(&mut self, lens: &ViewLens<Component<V>, C>) -> Handler<'_, B, C> {
        Handler {
            root: &mut *self.root,
            lens: self.lens.compose(lens),
            io: &mut *self.io,
        }
    }

    fn zoom_top_cell<C: 'static>(
        &mut self,
        lens: &ViewLens<Component<B>, C>,
    ) -> Handler<'_, B, C> {
        Handler {
            root: &mut *self.root,
            lens: lens.clone(),
            io: &mut *self.io,
        }
    }

    fn self_lens(&self) -> ViewLens<Component<B>, V> {
        self.lens.clone()
    }

    fn descriptor(&self) -> &ComponentConfig {
        &self.cell().config
    }
}
