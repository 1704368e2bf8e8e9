//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use std::path::{Path, PathBuf};

/// Default on-disk location for TransTrack records.
pub const DEFAULT_DATA_DIR: &str = "transtrack_data";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding one collection of records (`patients`, `donor_organs`, ...).
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.data_dir.join(collection)
    }
}

/// Resolve the records directory without reading environment variables.
///
/// Binaries read `TRANSTRACK_DATA_DIR` themselves and pass it in here; when no override is
/// given the relative default is used, which keeps development runs self-contained.
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/data"));
        assert_eq!(cfg.collection_dir("patients"), PathBuf::from("/data/patients"));
    }

    #[test]
    fn resolve_data_dir_prefers_override() {
        assert_eq!(
            resolve_data_dir(Some(PathBuf::from("/custom"))),
            PathBuf::from("/custom")
        );
        assert_eq!(resolve_data_dir(None), PathBuf::from(DEFAULT_DATA_DIR));
    }
}
