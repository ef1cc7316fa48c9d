// file id -> download URL, read from an optional tab-separated table
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::manifest::ManifestError;
use crate::core::graph::DELETE_PLACEHOLDER;

const ID_COLUMN: &[&str] = &["uuid", "id"];
const URL_COLUMN: &[&str] = &["url"];

/// Empty by default: every lookup yields the placeholder.
#[derive(Debug, Clone, Default)]
pub struct UrlResolver {
    urls: HashMap<String, String>,
}

impl UrlResolver {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ManifestError> {
        let rows = super::read_columns(reader, [ID_COLUMN, URL_COLUMN])?;
        Ok(Self {
            urls: rows.into_iter().map(|[id, url]| (id, url)).collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let resolver = Self::from_reader(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), entries = resolver.len(), "loaded url table");
        Ok(resolver)
    }

    pub fn url_for(&self, file_id: &str) -> &str {
        self.urls.get(file_id).map_or(DELETE_PLACEHOLDER, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
