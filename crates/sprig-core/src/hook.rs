//! Reload hooks
//!
//! A hook patches a live component in place. Hooks form a monoid under
//! sequential composition: `(f <> g)(c)` runs `f`, then `g` only if `f`
//! succeeded. The empty hook succeeds without touching its input.
//!
//! Hooks run with exclusive access to the live cell; they must not call
//! back into the live-patch or master-reloader capabilities of the same
//! application.

use crate::component::Component;
use crate::errors::HookError;
use crate::lens::Lens;
use std::fmt;
use std::sync::Arc;

/// A single patch step.
pub type HookFn<S> = dyn Fn(&mut Component<S>) -> Result<(), HookError> + Send + Sync;

/// Ordered, short-circuiting chain of in-place patch steps.
pub struct Hook<S: 'static> {
    steps: Vec<Arc<HookFn<S>>>,
}

impl<S: 'static> Default for Hook<S> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<S: 'static> Clone for Hook<S> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<S: 'static> fmt::Debug for Hook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("steps", &self.steps.len()).finish()
    }
}

impl<S: 'static> Hook<S> {
    /// The no-op hook that always succeeds.
    pub fn identity() -> Self {
        Self { steps: Vec::new() }
    }

    /// A hook with a single step.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut Component<S>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self {
            steps: vec![Arc::new(f)],
        }
    }

    /// A hook with a single step over the component's value.
    pub fn on_value<F>(f: F) -> Self
    where
        F: Fn(&mut S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self::from_fn(move |cell: &mut Component<S>| f(&mut cell.value))
    }

    /// Number of steps in the chain.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this is the identity hook.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sequential composition: `self` first, then `next`.
    pub fn then(mut self, next: Hook<S>) -> Self {
        self.steps.extend(next.steps);
        self
    }

    /// Appends `next` to this chain in place.
    pub fn append(&mut self, next: Hook<S>) {
        self.steps.extend(next.steps);
    }

    /// Runs every step in order, stopping at the first failure.
    ///
    /// Steps that ran before the failure keep their effects.
    pub fn run(&self, cell: &mut Component<S>) -> Result<(), HookError> {
        self.steps.iter().try_for_each(|step| step(cell))
    }

    /// Re-anchors this hook at a parent cell, reaching `S` through `lens`.
    pub fn lift<P: 'static>(self, lens: &Lens<Component<P>, Component<S>>) -> Hook<P> {
        Hook {
            steps: self
                .steps
                .into_iter()
                .map(|step| {
                    let lens = lens.clone();
                    Arc::new(move |parent: &mut Component<P>| step(lens.view_mut(parent)))
                        as Arc<HookFn<P>>
                })
                .collect(),
        }
    }
}

impl<S: 'static> FromIterator<Hook<S>> for Hook<S> {
    fn from_iter<I: IntoIterator<Item = Hook<S>>>(iter: I) -> Self {
        iter.into_iter().fold(Self::identity(), Hook::then)
    }
}
