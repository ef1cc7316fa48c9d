// metadata served from a JSON object keyed by file id
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use super::{FetchError, FieldSet, FileDocument, MetadataSource};

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct OfflineSource {
    documents: HashMap<String, FileDocument>,
}

impl OfflineSource {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let documents: HashMap<String, FileDocument> = serde_json::from_str(json)?;
        Ok(Self { documents })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, OfflineError> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| OfflineError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| OfflineError::Json { path: display, source })
    }

    pub fn insert(&mut self, file_id: impl Into<String>, document: FileDocument) {
        self.documents.insert(file_id.into(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl MetadataSource for OfflineSource {
    fn fetch(&self, file_id: &str, _fields: FieldSet) -> Result<FileDocument, FetchError> {
        self.documents
            .get(file_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(file_id.to_string()))
    }
}
