// Module declarations
pub mod identity;
pub mod mount;
pub mod config;

// Re-export all types from submodules
pub use identity::MountIdentity;
pub use mount::{MountOptions, MountOptionsBuilder};
pub use config::{LogLevel, MountRecord, UnifsConfig};
