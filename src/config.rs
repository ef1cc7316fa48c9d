// run configuration, independent of how it was collected
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::metadata::RetryPolicy;
use crate::metadata::client::DEFAULT_API_ROOT;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub manifest: PathBuf,
    /// UUID→URL table; without one every URL attribute is the placeholder.
    pub url_table: Option<PathBuf>,
    /// Create participants for every case a multi-case file names.
    pub all_cases: bool,
    pub api_root: String,
    /// Serve metadata from this JSON file instead of the API.
    pub metadata_json: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub basename: String,
    pub snapshot: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        let manifest = manifest.into();
        let basename = basename_for(&manifest);
        Self {
            manifest,
            url_table: None,
            all_cases: false,
            api_root: DEFAULT_API_ROOT.to_string(),
            metadata_json: None,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            output_dir: PathBuf::from("."),
            basename,
            snapshot: None,
        }
    }
}

/// Output basename: the manifest's file stem.
pub fn basename_for(manifest: &Path) -> String {
    manifest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_manifest_name() {
        let c = RunConfig::new("/data/gdc_manifest_20180101.txt");
        assert_eq!(c.basename, "gdc_manifest_20180101");
        assert_eq!(c.api_root, "https://api.gdc.cancer.gov");
        assert_eq!(c.retry.attempts, 5);
        assert_eq!(c.timeout, Duration::from_secs(5));
        assert!(!c.all_cases);
        assert_eq!(basename_for(Path::new("/")), "manifest");
    }
}
