//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::{WardError, WardResult};
use std::path::{Path, PathBuf};

/// Number of beds provisioned when a deployment does not configure one.
pub const DEFAULT_BED_COUNT: u32 = 20;

/// Name of the snapshot file kept under the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "ward.json";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    ward_data_dir: PathBuf,
    bed_count: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The bed count is the size of the fixed pool created when no snapshot
    /// exists yet; it must be representable (zero is allowed, modelling a ward
    /// with no capacity).
    pub fn new(ward_data_dir: PathBuf, bed_count: u32) -> WardResult<Self> {
        if ward_data_dir.as_os_str().is_empty() {
            return Err(WardError::Validation(
                "ward data directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            ward_data_dir,
            bed_count,
        })
    }

    pub fn ward_data_dir(&self) -> &Path {
        &self.ward_data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.ward_data_dir.join(SNAPSHOT_FILE_NAME)
    }

    pub fn bed_count(&self) -> u32 {
        self.bed_count
    }
}

/// Resolve the data directory from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, falls back to `/ward_data`.
pub fn ward_data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/ward_data"))
}

/// Parse the bed count from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_BED_COUNT`].
pub fn bed_count_from_env_value(value: Option<String>) -> WardResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_BED_COUNT),
        Some(v) => v
            .parse::<u32>()
            .map_err(|e| WardError::Validation(format!("invalid bed count {:?}: {}", v, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rejects_empty_data_dir() {
        let err = CoreConfig::new(PathBuf::new(), 20).expect_err("should reject empty path");
        assert!(matches!(err, WardError::Validation(_)));
    }

    #[test]
    fn test_snapshot_path_is_under_data_dir() {
        let config = CoreConfig::new(PathBuf::from("/tmp/ward"), 20).expect("valid config");
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/ward/ward.json"));
    }

    #[test]
    fn test_bed_count_defaults_when_unset() {
        assert_eq!(
            bed_count_from_env_value(None).expect("default"),
            DEFAULT_BED_COUNT
        );
        assert_eq!(
            bed_count_from_env_value(Some("  ".into())).expect("default"),
            DEFAULT_BED_COUNT
        );
    }

    #[test]
    fn test_bed_count_parses_and_rejects() {
        assert_eq!(bed_count_from_env_value(Some("8".into())).expect("parsed"), 8);
        let err = bed_count_from_env_value(Some("eight".into())).expect_err("should reject");
        assert!(matches!(err, WardError::Validation(_)));
    }
}
