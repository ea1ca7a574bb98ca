//! Filesystem instances: one opened backend rooted at `/`.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Result, UnifsError};
use crate::path::{join_fragments, SEPARATOR};
use crate::provider::{Provider, ProviderShared};
use crate::traits::{Backend, Capability, PathMatcher, PrincipalLookup, WatchService};
use crate::types::{MountIdentity, MountOptions};

/// One mounted backend, created and tracked by a [`Provider`].
///
/// Openness is not stored here: [`is_open`](Self::is_open) asks the provider
/// whether this exact instance is still registered for its identity. After
/// [`close`](Self::close), path construction and handle access fail with
/// [`UnifsError::Closed`].
pub struct FileSystem<B: Backend> {
    provider: Weak<ProviderShared<B>>,
    backend: Arc<B>,
    identity: MountIdentity,
    options: MountOptions,
    root: B::Path,
    handle: B::Handle,
    serial: u64,
}

impl<B: Backend> FileSystem<B> {
    pub(crate) fn new(
        provider: Weak<ProviderShared<B>>,
        backend: Arc<B>,
        identity: MountIdentity,
        options: MountOptions,
        handle: B::Handle,
        serial: u64,
    ) -> Self {
        let root = backend.new_path(&identity, SEPARATOR);
        Self {
            provider,
            backend,
            identity,
            options,
            root,
            handle,
            serial,
        }
    }

    /// The owning provider, unless it has been dropped.
    pub fn provider(&self) -> Option<Provider<B>> {
        self.provider.upgrade().map(Provider::from_shared)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn identity(&self) -> &MountIdentity {
        &self.identity
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    /// Process-unique number of this instance, for logs and diagnostics.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn separator(&self) -> &'static str {
        SEPARATOR
    }

    pub fn root(&self) -> &B::Path {
        &self.root
    }

    pub fn root_directories(&self) -> Vec<B::Path> {
        vec![self.root.clone()]
    }

    fn closed(&self) -> UnifsError {
        UnifsError::Closed {
            identity: self.identity.clone(),
        }
    }

    fn live_provider(&self) -> Result<Provider<B>> {
        match self.provider() {
            Some(provider) if provider.is_open(self) => Ok(provider),
            _ => Err(self.closed()),
        }
    }

    /// Joins `first` and `more` with the separator and parses the result
    /// through the provider's path factory.
    pub fn get_path(&self, first: &str, more: &[&str]) -> Result<B::Path> {
        let provider = self.live_provider()?;
        Ok(provider.new_path(self, &join_fragments(first, more)))
    }

    pub fn is_read_only(&self) -> bool {
        self.options.read_only || self.backend.is_read_only(&self.handle)
    }

    pub fn is_open(&self) -> bool {
        self.provider().is_some_and(|provider| provider.is_open(self))
    }

    /// Removes this instance from its provider. Closing twice is a no-op.
    pub fn close(&self) {
        if let Some(provider) = self.provider() {
            provider.remove_file_system(self);
        }
    }

    /// Backend state, regardless of whether the instance is still open.
    pub fn handle(&self) -> &B::Handle {
        &self.handle
    }

    /// Backend state for I/O; fails once the instance is closed.
    pub fn live_handle(&self) -> Result<&B::Handle> {
        if self.is_open() {
            Ok(&self.handle)
        } else {
            Err(self.closed())
        }
    }

    /// Fails with [`UnifsError::ReadOnly`] if writes are not allowed.
    pub fn check_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(UnifsError::ReadOnly {
                identity: self.identity.clone(),
            });
        }
        Ok(())
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::PathMatcher => self.backend.path_matching().is_some(),
            Capability::PrincipalLookup => self.backend.principal_lookup().is_some(),
            Capability::WatchService => self.backend.watch_support().is_some(),
        }
    }

    /// Compiles a `glob:` or `regex:` matcher.
    pub fn path_matcher(&self, syntax_and_pattern: &str) -> Result<Box<dyn PathMatcher>> {
        self.backend
            .path_matching()
            .ok_or(UnifsError::Unsupported {
                capability: Capability::PathMatcher,
            })?
            .compile(syntax_and_pattern)
    }

    pub fn user_principal_lookup(&self) -> Result<&dyn PrincipalLookup> {
        self.backend.principal_lookup().ok_or(UnifsError::Unsupported {
            capability: Capability::PrincipalLookup,
        })
    }

    pub fn new_watch_service(&self) -> Result<Box<dyn WatchService>> {
        let support = self.backend.watch_support().ok_or(UnifsError::Unsupported {
            capability: Capability::WatchService,
        })?;
        let handle = self.live_handle()?;
        support.new_watch_service(&self.identity, handle)
    }
}

impl<B: Backend> fmt::Display for FileSystem<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.identity, f)
    }
}

impl<B: Backend> fmt::Debug for FileSystem<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("identity", &self.identity)
            .field("serial", &self.serial)
            .field("read_only", &self.is_read_only())
            .field("open", &self.is_open())
            .finish()
    }
}
