//! View lenses
//!
//! A lens is a reified accessor for some "child" part of type `B` stored inside
//! a "parent" object of type `A`. Lenses here are a pair of borrowing
//! projections (shared and exclusive), so reading through a lens never copies
//! and writing through it replaces the child slot in place.
//!
//! Lenses compose: `A -> B` followed by `B -> C` gives `A -> C`. A
//! [`ViewLens`] is a lens whose target is a whole [`Component`] cell; it is the
//! form the composition capability navigates with. [`sub_view`] promotes an
//! ordinary per-component field lens into the cell-aware form.

use crate::component::Component;
use std::fmt;
use std::sync::Arc;

/// Shared projection from `A` to `B`.
pub type ViewFn<A, B> = dyn Fn(&A) -> &B + Send + Sync;

/// Exclusive projection from `A` to `B`.
pub type ViewMutFn<A, B> = dyn Fn(&mut A) -> &mut B + Send + Sync;

/// Bidirectional accessor from a parent `A` to a child `B`.
///
/// The accessor laws hold for every lens built from field projections:
/// `get(put(p, c)) == c` and `put(p, get(p)) == p`.
pub struct Lens<A: 'static, B: 'static> {
    view: Arc<ViewFn<A, B>>,
    view_mut: Arc<ViewMutFn<A, B>>,
}

/// Lens from a parent state type to a nested component cell.
pub type ViewLens<P, C> = Lens<P, Component<C>>;

// derive(Clone) would require A: Clone and B: Clone
impl<A: 'static, B: 'static> Clone for Lens<A, B> {
    fn clone(&self) -> Self {
        Self {
            view: Arc::clone(&self.view),
            view_mut: Arc::clone(&self.view_mut),
        }
    }
}

impl<A: 'static, B: 'static> fmt::Debug for Lens<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lens<{}, {}>",
            std::any::type_name::<A>(),
            std::any::type_name::<B>()
        )
    }
}

impl<A: 'static> Lens<A, A> {
    /// Identity lens.
    pub fn identity() -> Self {
        Self::new(|a: &A| a, |a: &mut A| a)
    }
}

impl<A: 'static, B: 'static> Lens<A, B> {
    /// Builds a lens from a shared and an exclusive projection.
    ///
    /// Both projections must address the same part of `A`.
    pub fn new<F, G>(view: F, view_mut: G) -> Self
    where
        F: Fn(&A) -> &B + Send + Sync + 'static,
        G: Fn(&mut A) -> &mut B + Send + Sync + 'static,
    {
        Self {
            view: Arc::new(view),
            view_mut: Arc::new(view_mut),
        }
    }

    /// Borrows the child.
    pub fn view<'a>(&self, parent: &'a A) -> &'a B {
        (self.view)(parent)
    }

    /// Mutably borrows the child.
    pub fn view_mut<'a>(&self, parent: &'a mut A) -> &'a mut B {
        (self.view_mut)(parent)
    }

    /// Reads a copy of the child.
    pub fn get(&self, parent: &A) -> B
    where
        B: Clone,
    {
        self.view(parent).clone()
    }

    /// Replaces the child slot in place.
    pub fn set(&self, parent: &mut A, child: B) {
        *self.view_mut(parent) = child;
    }

    /// Write-back: returns `parent` with the child replaced.
    pub fn put(&self, mut parent: A, child: B) -> A {
        self.set(&mut parent, child);
        parent
    }

    /// Applies `f` to the child in place.
    pub fn over<R>(&self, parent: &mut A, f: impl FnOnce(&mut B) -> R) -> R {
        f(self.view_mut(parent))
    }

    /// Lens composition: `A -> B` followed by `B -> C`.
    pub fn compose<C: 'static>(&self, next: &Lens<B, C>) -> Lens<A, C> {
        let (outer, inner) = (Arc::clone(&self.view), Arc::clone(&next.view));
        let (outer_mut, inner_mut) = (Arc::clone(&self.view_mut), Arc::clone(&next.view_mut));
        Lens::new(
            move |a: &A| inner(outer(a)),
            move |a: &mut A| inner_mut(outer_mut(a)),
        )
    }
}

/// Lens from a component cell to the state value it wraps.
pub fn value_lens<S: 'static>() -> Lens<Component<S>, S> {
    Lens::new(
        |c: &Component<S>| &c.value,
        |c: &mut Component<S>| &mut c.value,
    )
}

/// Lens from a component cell to its descriptor.
pub fn config_lens<S: 'static>() -> Lens<Component<S>, crate::ComponentConfig> {
    Lens::new(
        |c: &Component<S>| &c.config,
        |c: &mut Component<S>| &mut c.config,
    )
}

/// Promotes a field lens on `P` into a lens starting at the cell holding `P`.
pub fn sub_view<P: 'static, C: 'static>(lens: &ViewLens<P, C>) -> ViewLens<Component<P>, C> {
    value_lens::<P>().compose(lens)
}

/// Builds a [`Lens`] for a (possibly nested) struct field.
///
/// ```rust,ignore
/// let blog: ViewLens<App, Blog> = lens!(App => blog);
/// let title = lens!(Blog => meta.title);
/// ```
#[macro_export]
macro_rules! lens {
    ($parent:ty => $($field:tt).+) => {
        $crate::Lens::new(
            |p: &$parent| &p.$($field).+,
            |p: &mut $parent| &mut p.$($field).+,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Inner {
        count: u32,
        label: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Outer {
        inner: Inner,
        flag: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Top {
        outer: Outer,
        id: u64,
    }

    fn arb_top() -> impl Strategy<Value = Top> {
        (any::<u32>(), "[a-z]{0,8}", any::<bool>(), any::<u64>()).prop_map(
            |(count, label, flag, id)| Top {
                outer: Outer {
                    inner: Inner { count, label },
                    flag,
                },
                id,
            },
        )
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Shelf {
        book: Component<Inner>,
    }

    fn cell<S>(value: S, id: &str) -> Component<S> {
        let mut config = crate::ComponentConfig::detached(".");
        config.id = Some(id.to_string());
        config.route_context = vec![id.to_string()];
        Component::detached(config, value)
    }

    fn arb_shelf() -> impl Strategy<Value = Component<Shelf>> {
        (any::<u32>(), "[a-z]{0,8}", "[a-z]{1,6}", "[a-z]{1,6}").prop_map(
            |(count, label, shelf, book)| {
                cell(Shelf { book: cell(Inner { count, label }, &book) }, &shelf)
            },
        )
    }

    fn descriptor_fields(config: &crate::ComponentConfig) -> (Option<String>, Vec<String>) {
        (config.id.clone(), config.route_context.clone())
    }

    #[test]
    fn test_identity_lens() {
        let lens = Lens::<u32, u32>::identity();
        let mut v = 4;
        assert_eq!(*lens.view(&v), 4);
        lens.set(&mut v, 9);
        assert_eq!(v, 9);
    }

    #[test]
    fn test_macro_nested_field() {
        let lens = lens!(Top => outer.inner.count);
        let mut top = Top {
            outer: Outer {
                inner: Inner {
                    count: 1,
                    label: "a".into(),
                },
                flag: false,
            },
            id: 0,
        };
        lens.over(&mut top, |c| *c += 41);
        assert_eq!(top.outer.inner.count, 42);
    }

    proptest! {
        /// get(put(p, c)) == c
        #[test]
        fn put_then_get(top in arb_top(), label in "[a-z]{0,8}") {
            let lens = lens!(Top => outer.inner.label);
            let updated = lens.put(top, label.clone());
            prop_assert_eq!(lens.get(&updated), label);
        }

        /// put(p, get(p)) == p
        #[test]
        fn get_then_put(top in arb_top()) {
            let lens = lens!(Top => outer.inner);
            let child = lens.get(&top);
            prop_assert_eq!(lens.put(top.clone(), child), top);
        }

        #[test]
        fn sub_view_laws(shelf in arb_shelf(), other in arb_shelf()) {
            let lens = sub_view(&lens!(Shelf => book));
            let child = other.value.book.clone();
            prop_assert_eq!(lens.get(&lens.put(shelf.clone(), child.clone())), child);
            let own = lens.get(&shelf);
            prop_assert_eq!(lens.put(shelf.clone(), own), shelf);
        }

        #[test]
        fn value_lens_laws(shelf in arb_shelf(), other in arb_shelf()) {
            let lens = value_lens::<Shelf>();
            let value = other.value.clone();
            prop_assert_eq!(lens.get(&lens.put(shelf.clone(), value.clone())), value);
            let own = lens.get(&shelf);
            prop_assert_eq!(lens.put(shelf.clone(), own), shelf);
        }

        #[test]
        fn config_lens_laws(shelf in arb_shelf(), other in arb_shelf()) {
            let lens = config_lens::<Shelf>();
            let config = other.config.clone();
            let updated = lens.put(shelf.clone(), config.clone());
            prop_assert_eq!(descriptor_fields(&lens.get(&updated)), descriptor_fields(&config));
            let own = lens.get(&shelf);
            prop_assert_eq!(lens.put(shelf.clone(), own), shelf);
        }

        /// (A -> B) . ((B -> C) . (C -> D)) == ((A -> B) . (B -> C)) . (C -> D)
        #[test]
        fn composition_is_associative(top in arb_top(), count in any::<u32>()) {
            let ab = lens!(Top => outer);
            let bc = lens!(Outer => inner);
            let cd = lens!(Inner => count);

            let left = ab.compose(&bc).compose(&cd);
            let right = ab.compose(&bc.compose(&cd));

            prop_assert_eq!(left.get(&top), right.get(&top));
            prop_assert_eq!(
                left.put(top.clone(), count),
                right.put(top.clone(), count)
            );
        }
    }
}
