//! # unifs memory backend
//!
//! A `mem://` backend that keeps each filesystem instance as a tree in
//! process memory. Every identity gets its own empty tree when opened; the
//! tree is dropped when the instance is closed.
//!
//! The backend opts into `glob:` and `regex:` path matching. Principal lookup
//! and watch services are unsupported.
//!
//! ```rust,ignore
//! use unifs_core::MountIdentity;
//! use unifs_memory::MemoryFileSystem;
//!
//! let provider = unifs_memory::provider();
//! let fs = provider.get_or_create_file_system(&MountIdentity::new("mem://a")?)?;
//! fs.create_dir_all(&fs.get_path("/docs", &[])?)?;
//! fs.write(&fs.get_path("/docs/readme.md", &[])?, "hello")?;
//! ```

pub mod tree;

use bytes::Bytes;
use tracing::{debug, trace};
use unifs_core::matcher::StandardPathMatching;
use unifs_core::traits::PathMatching;
use unifs_core::{
    Backend, FileSystem, MountIdentity, MountOptions, Provider, Result, UnifsError, VirtualPath,
};

pub use tree::{EntryKind, MemoryTree};

/// URI scheme served by [`MemoryBackend`].
pub const SCHEME: &str = "mem";

/// Mount attribute that opens the tree read-only.
pub const READONLY_ATTRIBUTE: &str = "readonly";

/// Backend storing files and directories in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

impl Backend for MemoryBackend {
    type Path = VirtualPath;
    type Handle = MemoryTree;

    fn scheme(&self) -> &str {
        SCHEME
    }

    fn open(&self, identity: &MountIdentity, options: &MountOptions) -> Result<MemoryTree> {
        let read_only = options.flag(READONLY_ATTRIBUTE);
        debug!("Opening memory tree for {} (read_only={})", identity, read_only);
        Ok(MemoryTree::new(identity.clone(), read_only))
    }

    fn release(&self, identity: &MountIdentity, tree: &MemoryTree) {
        debug!("Dropping {} entries of {}", tree.len(), identity);
        tree.release();
    }

    fn is_read_only(&self, tree: &MemoryTree) -> bool {
        tree.is_read_only()
    }

    fn path_matching(&self) -> Option<&dyn PathMatching> {
        Some(&StandardPathMatching)
    }
}

pub type MemoryProvider = Provider<MemoryBackend>;

/// A provider over [`MemoryBackend`].
pub fn provider() -> MemoryProvider {
    Provider::new(MemoryBackend)
}

/// Content operations on a memory filesystem instance.
///
/// All operations fail with [`UnifsError::Closed`] once the instance is
/// closed and with [`UnifsError::ProviderMismatch`] for paths from another
/// filesystem. Writes fail with [`UnifsError::ReadOnly`] on read-only
/// instances. Relative paths are resolved against the root.
pub trait MemoryFileSystem {
    fn create_dir(&self, path: &VirtualPath) -> Result<()>;
    fn create_dir_all(&self, path: &VirtualPath) -> Result<()>;
    fn write(&self, path: &VirtualPath, data: impl Into<Bytes>) -> Result<()>;
    fn read(&self, path: &VirtualPath) -> Result<Bytes>;
    fn list(&self, path: &VirtualPath) -> Result<Vec<VirtualPath>>;
    fn remove(&self, path: &VirtualPath) -> Result<()>;
    fn exists(&self, path: &VirtualPath) -> Result<bool>;
    fn is_dir(&self, path: &VirtualPath) -> Result<bool>;
}

fn tree_for<'a>(fs: &'a FileSystem<MemoryBackend>, path: &VirtualPath) -> Result<&'a MemoryTree> {
    if path.identity() != fs.identity() {
        return Err(UnifsError::ProviderMismatch {
            expected: fs.identity().clone(),
            found: path.identity().clone(),
        });
    }
    fs.live_handle()
}

fn writable_tree_for<'a>(
    fs: &'a FileSystem<MemoryBackend>,
    path: &VirtualPath,
) -> Result<&'a MemoryTree> {
    let tree = tree_for(fs, path)?;
    fs.check_writable()?;
    Ok(tree)
}

impl MemoryFileSystem for FileSystem<MemoryBackend> {
    fn create_dir(&self, path: &VirtualPath) -> Result<()> {
        trace!("create_dir {} on {}", path, self);
        writable_tree_for(self, path)?.create_dir(path)
    }

    fn create_dir_all(&self, path: &VirtualPath) -> Result<()> {
        trace!("create_dir_all {} on {}", path, self);
        writable_tree_for(self, path)?.create_dir_all(path)
    }

    fn write(&self, path: &VirtualPath, data: impl Into<Bytes>) -> Result<()> {
        trace!("write {} on {}", path, self);
        writable_tree_for(self, path)?.write(path, data.into())
    }

    fn read(&self, path: &VirtualPath) -> Result<Bytes> {
        tree_for(self, path)?.read(path)
    }

    fn list(&self, path: &VirtualPath) -> Result<Vec<VirtualPath>> {
        tree_for(self, path)?.list(path)
    }

    fn remove(&self, path: &VirtualPath) -> Result<()> {
        trace!("remove {} on {}", path, self);
        writable_tree_for(self, path)?.remove(path)
    }

    fn exists(&self, path: &VirtualPath) -> Result<bool> {
        Ok(tree_for(self, path)?.kind(path)?.is_some())
    }

    fn is_dir(&self, path: &VirtualPath) -> Result<bool> {
        Ok(tree_for(self, path)?.kind(path)? == Some(EntryKind::Directory))
    }
}
