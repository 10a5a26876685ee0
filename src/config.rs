use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Options understood by the loaders.
///
/// Field names follow the camelCase keys used in existing processing
/// scripts, so an options file like `{"k": 2.5, "readSecond": true}`
/// deserializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadOptions {
    /// Report progress at info level and log every diagnostic.
    pub verbose: bool,
    /// Geometric factor override applied to amplitudes.
    pub k: f64,
    /// Read the second data block of files that contain two.
    pub read_second: bool,
    /// Drop the leading junk sample written by SIP-Fuchs devices.
    pub del_last: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            verbose: false,
            k: 1.0,
            read_second: false,
            del_last: true,
        }
    }
}

impl LoadOptions {
    /// Read options from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options file {}", path.display()))?;
        serde_json::from_str(&text).context("parsing options JSON")
    }

    /// Level for progress messages: info when verbose, debug otherwise.
    pub(crate) fn progress_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_keys_and_defaults() {
        let opts: LoadOptions = serde_json::from_str(r#"{"readSecond": true, "k": 2.0}"#).unwrap();
        assert!(opts.read_second);
        assert_eq!(opts.k, 2.0);
        assert!(opts.del_last);
        assert!(!opts.verbose);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opts.json");
        std::fs::write(&path, r#"{"delLast": false, "verbose": true}"#).unwrap();
        let opts = LoadOptions::from_json_file(&path).unwrap();
        assert!(!opts.del_last);
        assert!(opts.verbose);
        assert_eq!(opts.k, 1.0);
    }
}
