//! # unifs core
//!
//! Exposes non-native storage backends (archives, remote services, in-memory
//! trees) through one hierarchical path and filesystem interface.
//!
//! ## Overview
//!
//! The crate is built from three cooperating pieces:
//!
//! - [`path::VirtualPath`]: an immutable, `/`-separated location inside one
//!   filesystem, with parsing, joining, normalization and relativization.
//! - [`filesystem::FileSystem`]: one opened backend, rooted at `/`.
//! - [`provider::Provider`]: a registry that hands out at most one live
//!   filesystem per [`types::MountIdentity`] and forgets it on close.
//!
//! Backends plug in by implementing [`traits::Backend`]. The core performs no
//! content I/O; backends expose that on their own handle types.
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use unifs_core::provider::Provider;
//! use unifs_core::types::MountIdentity;
//!
//! fn example(provider: &Provider<MyBackend>) -> unifs_core::error::Result<()> {
//!     let fs = provider.get_or_create_file_system(&MountIdentity::new("mem://a")?)?;
//!     let path = fs.get_path("foo", &["bar"])?;
//!     assert_eq!(path.to_string(), "foo/bar");
//!     fs.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`traits`]: the backend trait and optional capability traits
//! - [`types`]: identities, mount options and configuration
//! - [`error`]: error types and handling
//! - [`matcher`]: `glob:` / `regex:` path matchers backends may opt into
//! - [`stats`]: provider lifecycle counters

pub mod traits;
pub mod types;
pub mod error;
pub mod path;
pub mod filesystem;
pub mod provider;
pub mod matcher;
pub mod stats;

#[cfg(test)]
mod testing;

pub use error::{Result, UnifsError};
pub use filesystem::FileSystem;
pub use path::{VirtualPath, SEPARATOR};
pub use provider::Provider;
pub use traits::{Backend, BackendPath, Capability};
pub use types::{MountIdentity, MountOptions};
