//! Configuration types for unifs.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::identity::MountIdentity;
use super::mount::MountOptions;
use crate::error::Result;

/// Log level for unifs front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only log errors
    Error,
    /// Log errors and warnings
    Warn,
    /// Log errors, warnings, and informational messages
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log everything including trace-level details
    Trace,
}

impl LogLevel {
    /// Returns the string representation of the log level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A filesystem to open at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRecord {
    /// Identity passed to the provider
    pub identity: MountIdentity,

    /// Options the instance is opened with
    #[serde(default)]
    pub options: MountOptions,
}

impl MountRecord {
    /// Creates a mount record with default options.
    pub fn new(identity: MountIdentity) -> Self {
        Self {
            identity,
            options: MountOptions::default(),
        }
    }
}

/// Top-level configuration, usually read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifsConfig {
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Filesystems to open
    #[serde(default)]
    pub mounts: Vec<MountRecord>,
}

impl UnifsConfig {
    /// Creates a new UnifsConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates the configuration, reporting every problem found.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for record in &self.mounts {
            if !seen.insert(&record.identity) {
                errors.push(format!("Duplicate mount identity: {}", record.identity));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config = UnifsConfig::from_json(
            r#"{
                "log_level": "debug",
                "mounts": [
                    { "identity": "mem://a" },
                    { "identity": "mem://b", "options": { "read_only": true } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.mounts.len(), 2);
        assert_eq!(config.mounts[0].identity.as_str(), "mem://a");
        assert!(!config.mounts[0].options.read_only);
        assert!(config.mounts[1].options.read_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_identity() {
        let err = UnifsConfig::from_json(r#"{"mounts": [{"identity": "nope"}]}"#).unwrap_err();
        assert!(matches!(err, crate::error::UnifsError::Config(_)));
    }

    #[test]
    fn test_validate_duplicates() {
        let id = MountIdentity::new("mem://a").unwrap();
        let config = UnifsConfig {
            log_level: LogLevel::Info,
            mounts: vec![MountRecord::new(id.clone()), MountRecord::new(id)],
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Duplicate mount identity: mem://a"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let config = UnifsConfig {
            log_level: LogLevel::Trace,
            mounts: vec![MountRecord::new(MountIdentity::new("mem://x").unwrap())],
        };
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = UnifsConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = UnifsConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, crate::error::UnifsError::Io { .. }));
    }
}
