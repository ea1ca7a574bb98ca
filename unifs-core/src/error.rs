//! Error types for the unifs core.

use crate::traits::Capability;
use crate::types::MountIdentity;
use thiserror::Error;

/// Error type shared by the provider, filesystem instances and backends.
#[derive(Debug, Error)]
pub enum UnifsError {
    /// The backend does not implement an optional capability.
    ///
    /// This is permanent for a given backend and must not be retried.
    #[error("Unsupported capability: {capability}")]
    Unsupported {
        capability: Capability,
    },

    /// Backend-specific construction of a filesystem failed.
    #[error("Failed to open filesystem {identity}: {reason}")]
    Construction {
        identity: MountIdentity,
        reason: String,
    },

    /// The filesystem instance was closed and can no longer be used.
    #[error("Filesystem is closed: {identity}")]
    Closed {
        identity: MountIdentity,
    },

    /// No live filesystem is registered for the identity.
    #[error("Filesystem not found: {identity}")]
    NotFound {
        identity: MountIdentity,
    },

    /// A live filesystem is already registered for the identity.
    #[error("Filesystem already exists: {identity}")]
    AlreadyExists {
        identity: MountIdentity,
    },

    /// The identity or URI could not be used by this provider.
    #[error("Invalid identity '{identity}': {reason}")]
    InvalidIdentity {
        identity: String,
        reason: String,
    },

    /// A path from one filesystem was combined with a path or provider of another.
    #[error("Provider mismatch: expected {expected}, found {found}")]
    ProviderMismatch {
        expected: MountIdentity,
        found: MountIdentity,
    },

    /// An argument was out of range or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A write was attempted on a read-only filesystem.
    #[error("Filesystem is read-only: {identity}")]
    ReadOnly {
        identity: MountIdentity,
    },

    /// A backend could not find the entry a path names.
    #[error("No such file or directory: {path}")]
    NoSuchPath {
        path: String,
    },

    /// An entry already exists at the path.
    #[error("Path already exists: {path}")]
    PathExists {
        path: String,
    },

    /// Expected a directory but found something else.
    #[error("Not a directory: {path}")]
    NotADirectory {
        path: String,
    },

    /// Expected a file but found a directory.
    #[error("Is a directory: {path}")]
    IsADirectory {
        path: String,
    },

    /// A directory still has entries.
    #[error("Directory not empty: {path}")]
    DirectoryNotEmpty {
        path: String,
    },

    /// I/O error from the underlying system.
    #[error("I/O error")]
    Io {
        #[from]
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl UnifsError {
    /// Shorthand for a construction failure.
    pub fn construction(identity: &MountIdentity, reason: impl Into<String>) -> Self {
        UnifsError::Construction {
            identity: identity.clone(),
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same operation can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            UnifsError::Unsupported { .. }
                | UnifsError::ProviderMismatch { .. }
                | UnifsError::InvalidIdentity { .. }
        )
    }
}

impl From<serde_json::Error> for UnifsError {
    fn from(err: serde_json::Error) -> Self {
        UnifsError::Config(err.to_string())
    }
}

/// Result type alias for unifs operations.
pub type Result<T> = std::result::Result<T, UnifsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let identity = MountIdentity::new("mem://a").unwrap();

        let err = UnifsError::Unsupported {
            capability: Capability::WatchService,
        };
        assert_eq!(err.to_string(), "Unsupported capability: watch service");

        let err = UnifsError::construction(&identity, "host unreachable");
        assert_eq!(
            err.to_string(),
            "Failed to open filesystem mem://a: host unreachable"
        );

        let err = UnifsError::Closed { identity: identity.clone() };
        assert_eq!(err.to_string(), "Filesystem is closed: mem://a");

        let err = UnifsError::NotFound { identity: identity.clone() };
        assert_eq!(err.to_string(), "Filesystem not found: mem://a");

        let err = UnifsError::AlreadyExists { identity: identity.clone() };
        assert_eq!(err.to_string(), "Filesystem already exists: mem://a");

        let err = UnifsError::InvalidIdentity {
            identity: "nope".to_string(),
            reason: "missing '://'".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid identity 'nope': missing '://'");

        let err = UnifsError::ReadOnly { identity };
        assert_eq!(err.to_string(), "Filesystem is read-only: mem://a");

        let err = UnifsError::NoSuchPath { path: "/foo".to_string() };
        assert_eq!(err.to_string(), "No such file or directory: /foo");

        let err = UnifsError::NotADirectory { path: "/foo".to_string() };
        assert_eq!(err.to_string(), "Not a directory: /foo");

        let err = UnifsError::DirectoryNotEmpty { path: "/foo".to_string() };
        assert_eq!(err.to_string(), "Directory not empty: /foo");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: UnifsError = io_err.into();
        assert!(matches!(err, UnifsError::Io { .. }));
    }

    #[test]
    fn test_permanent_errors() {
        let identity = MountIdentity::new("mem://a").unwrap();
        assert!(UnifsError::Unsupported { capability: Capability::PathMatcher }.is_permanent());
        assert!(!UnifsError::construction(&identity, "timeout").is_permanent());
        assert!(!UnifsError::Closed { identity }.is_permanent());
    }
}
