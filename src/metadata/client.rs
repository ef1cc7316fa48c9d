// blocking HTTP client for the GDC files endpoint
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{FetchError, FieldSet, FileDocument, MetadataSource};

pub const DEFAULT_API_ROOT: &str = "https://api.gdc.cancer.gov";

#[derive(Deserialize)]
struct Envelope {
    data: FileDocument,
}

pub struct GdcClient {
    http: Client,
    api_root: String,
}

impl GdcClient {
    pub fn new(api_root: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_root: api_root.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, file_id: &str, fields: FieldSet) -> String {
        format!("{}/files/{}?fields={}", self.api_root, file_id, fields.fields())
    }
}

impl MetadataSource for GdcClient {
    fn fetch(&self, file_id: &str, fields: FieldSet) -> Result<FileDocument, FetchError> {
        let url = self.url(file_id, fields);
        debug!(%file_id, ?fields, "fetching metadata");

        let response = self.http.get(&url).send().map_err(|source| FetchError::Transport {
            file_id: file_id.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                file_id: file_id.to_string(),
                status: response.status().as_u16(),
            });
        }

        let envelope: Envelope = response.json().map_err(|e| FetchError::Decode {
            file_id: file_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(envelope.data)
    }
}
