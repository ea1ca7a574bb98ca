//! The provider: a registry and factory of filesystem instances.
//!
//! A [`Provider`] holds at most one live [`FileSystem`] per mount identity.
//! Construction is serialized per identity: concurrent callers asking for the
//! same identity wait for a single backend `open` and all receive its result,
//! while unrelated identities are constructed in parallel. The registry lock
//! is never held across a backend call.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, UnifsError};
use crate::filesystem::FileSystem;
use crate::stats::{ProviderStats, StatsSnapshot};
use crate::traits::Backend;
use crate::types::{MountIdentity, MountOptions};

struct Registry<B: Backend> {
    /// Live instances keyed by identity
    live: HashMap<MountIdentity, Arc<FileSystem<B>>>,

    /// Per-identity gates held while a backend `open` is in flight
    constructing: HashMap<MountIdentity, Arc<Mutex<()>>>,
}

impl<B: Backend> Default for Registry<B> {
    fn default() -> Self {
        Self {
            live: HashMap::new(),
            constructing: HashMap::new(),
        }
    }
}

pub(crate) struct ProviderShared<B: Backend> {
    backend: Arc<B>,
    registry: Mutex<Registry<B>>,
    stats: ProviderStats,
    next_serial: AtomicU64,
}

impl<B: Backend> Drop for ProviderShared<B> {
    fn drop(&mut self) {
        let live = std::mem::take(&mut self.registry.get_mut().live);
        for (identity, fs) in live {
            debug!("Releasing filesystem {} on provider drop", identity);
            self.backend.release(&identity, fs.handle());
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Acquire {
    GetOrCreate,
    CreateOnly,
}

/// Manufactures and caches filesystem instances of one backend.
///
/// `Provider` is a cheap handle; clones share the same registry. The registry
/// starts empty and is drained by [`close_all`](Provider::close_all) or when
/// the last handle is dropped, at which point remaining instances are released.
pub struct Provider<B: Backend> {
    shared: Arc<ProviderShared<B>>,
}

impl<B: Backend> Clone for Provider<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: Backend> Provider<B> {
    /// Creates a provider with an empty registry.
    pub fn new(backend: B) -> Self {
        Self {
            shared: Arc::new(ProviderShared {
                backend: Arc::new(backend),
                registry: Mutex::new(Registry::default()),
                stats: ProviderStats::new(),
                next_serial: AtomicU64::new(1),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<ProviderShared<B>>) -> Self {
        Self { shared }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Scheme handled by this provider.
    pub fn scheme(&self) -> &str {
        self.shared.backend.scheme()
    }

    fn check_scheme(&self, identity: &MountIdentity) -> Result<()> {
        if !identity.scheme().eq_ignore_ascii_case(self.scheme()) {
            return Err(UnifsError::InvalidIdentity {
                identity: identity.to_string(),
                reason: format!("scheme must be '{}'", self.scheme()),
            });
        }
        Ok(())
    }

    /// Returns the live instance for `identity`, constructing it with default
    /// options on a miss.
    pub fn get_or_create_file_system(&self, identity: &MountIdentity) -> Result<Arc<FileSystem<B>>> {
        self.get_or_create_file_system_with(identity, &MountOptions::default())
    }

    /// Like [`get_or_create_file_system`](Self::get_or_create_file_system);
    /// `options` only apply when a new instance is constructed.
    pub fn get_or_create_file_system_with(
        &self,
        identity: &MountIdentity,
        options: &MountOptions,
    ) -> Result<Arc<FileSystem<B>>> {
        self.acquire(identity, options, Acquire::GetOrCreate)
    }

    /// Constructs a new instance, failing if one is already registered.
    pub fn new_file_system(
        &self,
        identity: &MountIdentity,
        options: &MountOptions,
    ) -> Result<Arc<FileSystem<B>>> {
        self.acquire(identity, options, Acquire::CreateOnly)
    }

    /// Returns the live instance for `identity` without constructing one.
    pub fn get_file_system(&self, identity: &MountIdentity) -> Result<Arc<FileSystem<B>>> {
        self.check_scheme(identity)?;
        self.shared
            .registry
            .lock()
            .live
            .get(identity)
            .cloned()
            .ok_or_else(|| UnifsError::NotFound {
                identity: identity.clone(),
            })
    }

    /// Resolves a URI such as `mem://a/foo/bar` to a path, opening the
    /// filesystem for `mem://a` if necessary.
    pub fn path_from_uri(&self, uri: &str) -> Result<B::Path> {
        let (identity, path) = MountIdentity::parse_uri(uri)?;
        let fs = self.get_or_create_file_system(&identity)?;
        fs.get_path(&path, &[])
    }

    fn acquire(
        &self,
        identity: &MountIdentity,
        options: &MountOptions,
        mode: Acquire,
    ) -> Result<Arc<FileSystem<B>>> {
        self.check_scheme(identity)?;

        let gate = {
            let mut registry = self.shared.registry.lock();
            if let Some(fs) = registry.live.get(identity) {
                return self.existing(fs, mode);
            }
            Arc::clone(registry.constructing.entry(identity.clone()).or_default())
        };

        let result = {
            let _guard = gate.lock();
            self.construct_if_absent(identity, options, mode)
        };

        let mut registry = self.shared.registry.lock();
        drop(gate);
        // Gates are only cloned under the registry lock, so the last holder removes it.
        if registry.constructing.get(identity).map(Arc::strong_count) == Some(1) {
            registry.constructing.remove(identity);
        }
        result
    }

    fn existing(&self, fs: &Arc<FileSystem<B>>, mode: Acquire) -> Result<Arc<FileSystem<B>>> {
        if mode == Acquire::CreateOnly {
            return Err(UnifsError::AlreadyExists {
                identity: fs.identity().clone(),
            });
        }
        self.shared.stats.record_reused();
        trace!("Reusing filesystem {} (instance {})", fs.identity(), fs.serial());
        Ok(Arc::clone(fs))
    }

    /// Runs with the identity's gate held.
    fn construct_if_absent(
        &self,
        identity: &MountIdentity,
        options: &MountOptions,
        mode: Acquire,
    ) -> Result<Arc<FileSystem<B>>> {
        if let Some(fs) = self.shared.registry.lock().live.get(identity) {
            return self.existing(fs, mode);
        }

        debug!("Opening filesystem {}", identity);
        let handle = match self.shared.backend.open(identity, options) {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.stats.record_failed();
                warn!("Failed to open filesystem {}: {}", identity, err);
                return Err(err);
            }
        };

        let serial = self.shared.next_serial.fetch_add(1, Ordering::Relaxed);
        let fs = Arc::new(FileSystem::new(
            Arc::downgrade(&self.shared),
            Arc::clone(&self.shared.backend),
            identity.clone(),
            options.clone(),
            handle,
            serial,
        ));

        self.shared
            .registry
            .lock()
            .live
            .insert(identity.clone(), Arc::clone(&fs));
        self.shared.stats.record_constructed();
        info!("Opened filesystem {} (instance {})", identity, serial);
        Ok(fs)
    }

    /// True iff the registry maps `fs`'s identity to exactly this instance.
    pub fn is_open(&self, fs: &FileSystem<B>) -> bool {
        self.shared
            .registry
            .lock()
            .live
            .get(fs.identity())
            .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), fs))
    }

    /// Removes `fs` from the registry if it is still the registered instance
    /// for its identity, then releases its backend state.
    ///
    /// A stale instance that was already replaced is left alone and `false`
    /// is returned.
    pub fn remove_file_system(&self, fs: &FileSystem<B>) -> bool {
        let removed = {
            let mut registry = self.shared.registry.lock();
            match registry.live.get(fs.identity()) {
                Some(current) if std::ptr::eq(Arc::as_ptr(current), fs) => {
                    registry.live.remove(fs.identity())
                }
                _ => None,
            }
        };

        match removed {
            Some(fs) => {
                self.shared.backend.release(fs.identity(), fs.handle());
                self.shared.stats.record_closed();
                info!("Closed filesystem {} (instance {})", fs.identity(), fs.serial());
                true
            }
            None => {
                trace!("Filesystem {} (instance {}) already closed", fs.identity(), fs.serial());
                false
            }
        }
    }

    /// Factory hook for backend paths scoped to `fs`.
    pub fn new_path(&self, fs: &FileSystem<B>, text: &str) -> B::Path {
        self.shared.backend.new_path(fs.identity(), text)
    }

    /// Snapshot of the live instances, ordered by identity.
    pub fn open_file_systems(&self) -> Vec<Arc<FileSystem<B>>> {
        let mut live: Vec<_> = self.shared.registry.lock().live.values().cloned().collect();
        live.sort_by(|a, b| a.identity().cmp(b.identity()));
        live
    }

    pub fn len(&self) -> usize {
        self.shared.registry.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every live instance and returns how many were closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.shared.registry.lock().live.drain().collect();
        for (identity, fs) in &drained {
            self.shared.backend.release(identity, fs.handle());
            self.shared.stats.record_closed();
        }
        if !drained.is_empty() {
            info!("Closed {} filesystem(s)", drained.len());
        }
        drained.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot(self.len())
    }
}

impl<B: Backend> fmt::Debug for Provider<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("scheme", &self.scheme())
            .field("open", &self.len())
            .finish()
    }
}
