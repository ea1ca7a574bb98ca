//! Options a filesystem instance is opened with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Options passed to a backend when a filesystem instance is constructed.
///
/// `attributes` is a free-form map interpreted by the backend (credentials
/// handles, archive encodings, timeouts and so on). The core never reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOptions {
    /// Whether the instance should refuse writes regardless of the backend
    #[serde(default)]
    pub read_only: bool,

    /// Backend-specific settings
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl MountOptions {
    /// Creates a new MountOptions with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder for MountOptions.
    pub fn builder() -> MountOptionsBuilder {
        MountOptionsBuilder::new()
    }

    /// Sets the mount as read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Looks up a backend attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Interprets a backend attribute as a boolean flag.
    ///
    /// `true`, `yes`, `on` and `1` (any case) are true; anything else,
    /// including a missing key, is false.
    pub fn flag(&self, key: &str) -> bool {
        self.attribute(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1"))
            .unwrap_or(false)
    }
}

/// Builder for MountOptions with a fluent interface.
#[derive(Debug, Default)]
pub struct MountOptionsBuilder {
    options: MountOptions,
}

impl MountOptionsBuilder {
    /// Creates a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mount as read-only.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.options.read_only = read_only;
        self
    }

    /// Adds a single backend attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.attributes.insert(key.into(), value.into());
        self
    }

    /// Builds the final MountOptions.
    pub fn build(self) -> MountOptions {
        self.options
    }
}
