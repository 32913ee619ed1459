//! Live application root
//!
//! Once the root component has been built it is published into a shared
//! cell. Requests read a snapshot of it; reloads and live patches write to it
//! under the exclusive lock.
//!
//! The lock is not reentrant. A thread that is already modifying the root
//! (a post-init hook calling `patch_live`, say) gets an error from a nested
//! write and `None` from a nested read instead of blocking on itself.

use parking_lot::{Mutex, RwLock};
use sprig_core::{Component, Result, SprigError};
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

/// Patch applied to the live root by a [`MasterReloader`].
pub type RootPatch<'p, B> = dyn FnMut(&mut Component<B>) + 'p;

struct Shared<B: 'static> {
    slot: RwLock<Option<Component<B>>>,
    // thread holding the write lock, if any
    writer: Mutex<Option<ThreadId>>,
}

/// Clears the recorded writer when the write lock is released.
struct WriterMark<'w>(&'w Mutex<Option<ThreadId>>);

impl Drop for WriterMark<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

/// Shared slot holding the running application's root cell.
pub struct LiveRoot<B: 'static> {
    shared: Arc<Shared<B>>,
}

impl<B: 'static> Clone for LiveRoot<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: 'static> fmt::Debug for LiveRoot<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveRoot")
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl<B: 'static> Default for LiveRoot<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: 'static> LiveRoot<B> {
    /// An empty slot; nothing is running yet.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: RwLock::new(None),
                writer: Mutex::new(None),
            }),
        }
    }

    /// Publishes the built root, replacing whatever was there.
    pub fn install(&self, root: Component<B>) -> Result<()> {
        self.refuse_nested_write()?;
        *self.shared.slot.write() = Some(root);
        Ok(())
    }

    /// Whether a root has been published.
    pub fn is_installed(&self) -> bool {
        // a thread writing the root has it installed
        self.held_here() || self.shared.slot.read().is_some()
    }

    /// Reads the live root under the shared lock.
    ///
    /// `None` when nothing is installed, or when the calling thread is the
    /// one modifying the root.
    pub fn read<R>(&self, f: impl FnOnce(&Component<B>) -> R) -> Option<R> {
        if self.held_here() {
            warn!("Live root read while this thread is modifying it");
            return None;
        }
        self.shared.slot.read().as_ref().map(f)
    }

    /// Mutates the live root under the exclusive lock.
    ///
    /// `Ok(None)` when nothing is installed. Fails when the calling thread
    /// is already modifying the root.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Component<B>) -> R) -> Result<Option<R>> {
        self.refuse_nested_write()?;
        let mut slot = self.shared.slot.write();
        let Some(root) = slot.as_mut() else {
            return Ok(None);
        };
        *self.shared.writer.lock() = Some(thread::current().id());
        let _mark = WriterMark(&self.shared.writer);
        Ok(Some(f(root)))
    }

    /// A private copy of the live root.
    pub fn snapshot(&self) -> Option<Component<B>>
    where
        B: Clone,
    {
        self.read(Component::clone)
    }

    fn held_here(&self) -> bool {
        *self.shared.writer.lock() == Some(thread::current().id())
    }

    fn refuse_nested_write(&self) -> Result<()> {
        if self.held_here() {
            warn!("Nested write to the live root refused");
            return Err(SprigError::internal(
                "live root is already being modified by this thread",
            ));
        }
        Ok(())
    }
}

impl<B: Send + Sync + 'static> LiveRoot<B> {
    /// Capability that patches this slot; a no-op until a root is installed.
    ///
    /// The reloader lives inside the root it patches, so it only holds a
    /// weak handle to the slot.
    pub fn master_reloader(&self) -> MasterReloader<B> {
        let live = self.downgrade();
        MasterReloader::new(move |patch| {
            let Some(live) = live.upgrade() else {
                debug!("Live root gone, patch dropped");
                return Ok(());
            };
            if live.modify(|root| patch(root))?.is_none() {
                debug!("Live root not installed, patch dropped");
            }
            Ok(())
        })
    }
}

impl<B: 'static> LiveRoot<B> {
    pub(crate) fn downgrade(&self) -> WeakLiveRoot<B> {
        WeakLiveRoot {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

/// Non-owning handle to a [`LiveRoot`].
pub(crate) struct WeakLiveRoot<B: 'static> {
    shared: Weak<Shared<B>>,
}

impl<B: 'static> WeakLiveRoot<B> {
    pub(crate) fn upgrade(&self) -> Option<LiveRoot<B>> {
        self.shared.upgrade().map(|shared| LiveRoot { shared })
    }
}

/// Capability to apply a patch to the live root cell.
pub struct MasterReloader<B: 'static> {
    apply: Arc<dyn Fn(&mut RootPatch<'_, B>) -> Result<()> + Send + Sync>,
}

impl<B: 'static> Clone for MasterReloader<B> {
    fn clone(&self) -> Self {
        Self {
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<B: 'static> fmt::Debug for MasterReloader<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterReloader")
    }
}

impl<B: 'static> MasterReloader<B> {
    /// Wraps a patch-applying function.
    pub fn new<F>(apply: F) -> Self
    where
        F: Fn(&mut RootPatch<'_, B>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            apply: Arc::new(apply),
        }
    }

    /// A reloader that drops every patch.
    pub fn detached() -> Self {
        Self::new(|_| Ok(()))
    }

    /// Applies `patch` to the live root, if there is one.
    pub fn apply(&self, patch: &mut RootPatch<'_, B>) -> Result<()> {
        (self.apply)(patch)
    }

    /// Applies a one-shot patch to the live root, if there is one.
    pub fn apply_once(&self, patch: impl FnOnce(&mut Component<B>)) -> Result<()> {
        let mut patch = Some(patch);
        self.apply(&mut |root: &mut Component<B>| {
            if let Some(patch) = patch.take() {
                patch(root);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::ComponentConfig;

    fn root(value: u32) -> Component<u32> {
        Component::detached(ComponentConfig::detached("."), value)
    }

    #[test]
    fn test_patch_before_install_is_dropped() {
        let live = LiveRoot::<u32>::new();
        let master = live.master_reloader();
        master.apply_once(|r| r.value = 9).unwrap();
        assert!(!live.is_installed());

        live.install(root(1)).unwrap();
        assert_eq!(live.read(|r| r.value), Some(1));
    }

    #[test]
    fn test_patch_after_install_lands() {
        let live = LiveRoot::new();
        live.install(root(1)).unwrap();
        live.master_reloader().apply_once(|r| r.value += 41).unwrap();
        assert_eq!(live.read(|r| r.value), Some(42));
    }

    #[test]
    fn test_patch_after_drop_is_dropped() {
        let live = LiveRoot::new();
        live.install(root(1)).unwrap();
        let master = live.master_reloader();
        drop(live);
        master.apply_once(|r| r.value = 2).unwrap();
    }

    #[test]
    fn test_nested_access_fails_instead_of_blocking() {
        let live = LiveRoot::new();
        live.install(root(1)).unwrap();
        let master = live.master_reloader();
        let nested = live
            .modify(|r| {
                r.value = 2;
                let read = live.read(|r| r.value);
                (read, master.apply_once(|r| r.value = 3))
            })
            .unwrap();
        let (read, patched) = nested.unwrap();
        assert_eq!(read, None);
        assert!(matches!(patched, Err(SprigError::Internal { .. })));
        assert_eq!(live.read(|r| r.value), Some(2));
        assert!(live.modify(|r| r.value = 4).unwrap().is_some());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let live = LiveRoot::new();
        live.install(root(1)).unwrap();
        let mut copy = live.snapshot().unwrap();
        copy.value = 5;
        assert_eq!(live.read(|r| r.value), Some(1));
    }
}
