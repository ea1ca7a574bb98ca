//! Traits that backend integrations implement.
//!
//! A backend plugs into the core by implementing [`Backend`]. Its associated
//! types fix the concrete path and per-instance state at compile time, so a
//! `Provider<B>` can only ever hand out `FileSystem<B>` values whose paths are
//! `B::Path`.
//!
//! Optional capabilities are separate traits. A backend advertises one by
//! returning `Some` from the matching query on [`Backend`]; everything else is
//! reported to callers as [`UnifsError::Unsupported`](crate::error::UnifsError).

use std::fmt;
use std::hash::Hash;

use crate::error::Result;
use crate::path::VirtualPath;
use crate::types::{MountIdentity, MountOptions};

/// Optional capabilities a backend may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Compiling `glob:` / `regex:` path matchers
    PathMatcher,
    /// Looking up user and group principals
    PrincipalLookup,
    /// Watching the hierarchy for changes
    WatchService,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::PathMatcher,
        Capability::PrincipalLookup,
        Capability::WatchService,
    ];

    /// Returns a human-readable name for the capability.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::PathMatcher => "path matcher",
            Capability::PrincipalLookup => "principal lookup",
            Capability::WatchService => "watch service",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A backend's path representation.
///
/// Backends that need extra per-path data wrap a [`VirtualPath`]; the rest
/// use `VirtualPath` directly.
pub trait BackendPath:
    Clone + Eq + Ord + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static
{
    /// Wraps a parsed path.
    fn from_virtual(path: VirtualPath) -> Self;

    /// Returns the underlying path.
    fn as_virtual(&self) -> &VirtualPath;
}

impl BackendPath for VirtualPath {
    fn from_virtual(path: VirtualPath) -> Self {
        path
    }

    fn as_virtual(&self) -> &VirtualPath {
        self
    }
}

/// The construction and capability hooks of a storage backend.
///
/// Content I/O is not part of this trait; backends expose it on their own
/// types, keyed by `Self::Path` and reached through `FileSystem::live_handle`.
pub trait Backend: Send + Sync + Sized + 'static {
    /// Path type handed out by filesystems of this backend.
    type Path: BackendPath;

    /// State owned by one filesystem instance (a connection, an open archive,
    /// an in-memory tree).
    type Handle: Send + Sync + 'static;

    /// URI scheme served by this backend, lowercase.
    fn scheme(&self) -> &str;

    /// Opens the backend for `identity`.
    ///
    /// Called at most once per cache miss, never concurrently for the same
    /// identity. A failure leaves nothing registered.
    fn open(&self, identity: &MountIdentity, options: &MountOptions) -> Result<Self::Handle>;

    /// Tears down an instance once it has left the registry.
    ///
    /// Runs exactly once per successfully opened instance. Failures here are
    /// the backend's to report; the core treats close as infallible.
    fn release(&self, _identity: &MountIdentity, _handle: &Self::Handle) {}

    /// Builds a backend path. Override to attach backend-specific data.
    fn new_path(&self, identity: &MountIdentity, text: &str) -> Self::Path {
        Self::Path::from_virtual(VirtualPath::parse(identity, text))
    }

    /// Whether the underlying store is immutable.
    fn is_read_only(&self, _handle: &Self::Handle) -> bool {
        false
    }

    fn path_matching(&self) -> Option<&dyn PathMatching> {
        None
    }

    fn principal_lookup(&self) -> Option<&dyn PrincipalLookup> {
        None
    }

    fn watch_support(&self) -> Option<&dyn WatchSupport<Self::Handle>> {
        None
    }
}

/// A compiled path predicate.
pub trait PathMatcher: Send + Sync {
    fn matches(&self, path: &VirtualPath) -> bool;
}

/// Capability: compile `syntax:pattern` strings into matchers.
pub trait PathMatching: Send + Sync {
    fn compile(&self, syntax_and_pattern: &str) -> Result<Box<dyn PathMatcher>>;
}

/// Whether a principal names a user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    User,
    Group,
}

/// An identity that can own or be granted access to entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub name: String,
    pub kind: PrincipalKind,
}

/// Capability: resolve user and group names.
pub trait PrincipalLookup: Send + Sync {
    fn lookup_user(&self, name: &str) -> Result<Principal>;
    fn lookup_group(&self, name: &str) -> Result<Principal>;
}

/// Kind of change reported by a watch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Created,
    Modified,
    Deleted,
    /// Events were lost
    Overflow,
}

/// A change observed under a watched filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: VirtualPath,
}

/// A source of change events for one filesystem instance.
pub trait WatchService: Send {
    /// Returns and clears the events observed since the last poll.
    fn poll(&mut self) -> Vec<WatchEvent>;
}

/// Capability: create watch services over an instance's state.
pub trait WatchSupport<H>: Send + Sync {
    fn new_watch_service(
        &self,
        identity: &MountIdentity,
        handle: &H,
    ) -> Result<Box<dyn WatchService>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::PathMatcher.to_string(), "path matcher");
        assert_eq!(Capability::PrincipalLookup.to_string(), "principal lookup");
        assert_eq!(Capability::WatchService.to_string(), "watch service");
    }

    #[test]
    fn test_virtual_path_is_a_backend_path() {
        let id = MountIdentity::new("mem://a").unwrap();
        let path = <VirtualPath as BackendPath>::from_virtual(VirtualPath::parse(&id, "/x"));
        assert_eq!(path.as_virtual().to_string(), "/x");
    }
}
