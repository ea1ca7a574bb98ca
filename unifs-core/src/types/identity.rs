//! Mount identities: the registry key of a filesystem instance.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnifsError};

const SCHEME_SEPARATOR: &str = "://";

/// Identifies which backend and location a filesystem instance represents.
///
/// Always of the form `scheme://authority`, where the scheme is lowercased
/// and the authority may be empty. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MountIdentity {
    inner: Arc<str>,
    scheme_len: usize,
}

impl MountIdentity {
    /// Parses an identity of the form `scheme://authority`.
    pub fn new(text: &str) -> Result<Self> {
        let (identity, _) = Self::parse_uri(text)?;
        if identity.inner.len() != text.len() {
            return Err(UnifsError::InvalidIdentity {
                identity: text.to_string(),
                reason: "identity must not contain a path component".to_string(),
            });
        }
        Ok(identity)
    }

    /// Splits a URI into its mount identity and the path text that follows it.
    ///
    /// `mem://a/foo/bar` yields (`mem://a`, `/foo/bar`). A URI without a path
    /// component yields the root path `/`.
    pub fn parse_uri(uri: &str) -> Result<(Self, String)> {
        let invalid = |reason: &str| UnifsError::InvalidIdentity {
            identity: uri.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = uri
            .split_once(SCHEME_SEPARATOR)
            .ok_or_else(|| invalid("missing '://'"))?;

        let mut chars = scheme.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            Some(_) => return Err(invalid("scheme must start with a letter")),
            None => return Err(invalid("empty scheme")),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return Err(invalid("scheme contains illegal characters"));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let scheme = scheme.to_ascii_lowercase();
        let inner: Arc<str> = format!("{}{}{}", scheme, SCHEME_SEPARATOR, authority).into();
        Ok((
            Self {
                inner,
                scheme_len: scheme.len(),
            },
            path.to_string(),
        ))
    }

    /// Returns the full identity text.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns the (lowercased) scheme.
    pub fn scheme(&self) -> &str {
        &self.inner[..self.scheme_len]
    }

    /// Returns the authority, which may be empty.
    pub fn authority(&self) -> &str {
        &self.inner[self.scheme_len + SCHEME_SEPARATOR.len()..]
    }
}

impl fmt::Display for MountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl TryFrom<String> for MountIdentity {
    type Error = UnifsError;

    fn try_from(value: String) -> Result<Self> {
        MountIdentity::new(&value)
    }
}

impl TryFrom<&str> for MountIdentity {
    type Error = UnifsError;

    fn try_from(value: &str) -> Result<Self> {
        MountIdentity::new(value)
    }
}

impl From<MountIdentity> for String {
    fn from(identity: MountIdentity) -> Self {
        identity.inner.to_string()
    }
}

impl AsRef<str> for MountIdentity {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}
