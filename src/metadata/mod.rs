// interface to the remote file-metadata service
pub mod client;
pub mod offline;
pub mod retry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::GdcClient;
pub use offline::OfflineSource;
pub use retry::{RetryPolicy, Retrying};

/// The field specifications the core requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSet {
    /// Category, type, format, access, strategy, workflow and program.
    FileInfo,
    /// Participant identity.
    Cases,
    /// Participant and sample identity.
    CasesAndSamples,
    /// Sample type plus aliquot barcode for each sample of a paired file.
    TumorNormalSpecimens,
    /// Aliquot barcode of a single-sample file.
    Specimens,
}

impl FieldSet {
    pub fn fields(self) -> &'static str {
        match self {
            FieldSet::FileInfo => {
                "data_category,data_type,data_format,access,experimental_strategy,analysis.workflow_type,cases.project.program.name"
            }
            FieldSet::Cases => "cases.case_id,cases.submitter_id,cases.project.project_id",
            FieldSet::CasesAndSamples => {
                "cases.case_id,cases.submitter_id,cases.project.project_id,cases.samples.sample_id,cases.samples.submitter_id,cases.samples.sample_type_id"
            }
            FieldSet::TumorNormalSpecimens => {
                "cases.samples.sample_type,cases.samples.portions.analytes.aliquots.submitter_id,cases.samples.sample_type_id"
            }
            FieldSet::Specimens => {
                "cases.project.program.name,cases.samples.portions.analytes.aliquots.submitter_id"
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDocument {
    #[serde(default)]
    pub data_category: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub data_format: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub experimental_strategy: Option<String>,
    #[serde(default)]
    pub analysis: Option<Analysis>,
    #[serde(default)]
    pub cases: Vec<CaseDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub workflow_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDocument {
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub submitter_id: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectDocument>,
    /// `None` when the service reported no sample breakdown at all.
    #[serde(default)]
    pub samples: Option<Vec<SampleDocument>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub program: Option<ProgramDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDocument {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleDocument {
    #[serde(default)]
    pub sample_id: Option<String>,
    #[serde(default)]
    pub submitter_id: Option<String>,
    #[serde(default)]
    pub sample_type_id: Option<String>,
    #[serde(default)]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub portions: Vec<PortionDocument>,
}

impl SampleDocument {
    /// Barcode of the first aliquot of the first analyte of the first portion.
    pub fn aliquot_barcode(&self) -> Option<&str> {
        self.portions
            .first()?
            .analytes
            .first()?
            .aliquots
            .first()?
            .submitter_id
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortionDocument {
    #[serde(default)]
    pub analytes: Vec<AnalyteDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyteDocument {
    #[serde(default)]
    pub aliquots: Vec<AliquotDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliquotDocument {
    #[serde(default)]
    pub submitter_id: Option<String>,
}

impl FileDocument {
    pub fn program_name(&self) -> Option<&str> {
        self.cases
            .first()?
            .project
            .as_ref()?
            .program
            .as_ref()?
            .name
            .as_deref()
    }

    pub fn workflow_type(&self) -> Option<&str> {
        self.analysis.as_ref()?.workflow_type.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {file_id} failed: {source}")]
    Transport {
        file_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("metadata service returned {status} for {file_id}")]
    Status { file_id: String, status: u16 },
    #[error("could not decode metadata for {file_id}: {reason}")]
    Decode { file_id: String, reason: String },
    #[error("no metadata known for {0}")]
    NotFound(String),
}

impl FetchError {
    /// Worth another attempt: transport trouble, throttling, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode { .. } | FetchError::NotFound(_) => false,
        }
    }
}

/// Blocking request/response access to file metadata.
pub trait MetadataSource {
    fn fetch(&self, file_id: &str, fields: FieldSet) -> Result<FileDocument, FetchError>;
}

impl<S: MetadataSource + ?Sized> MetadataSource for &S {
    fn fetch(&self, file_id: &str, fields: FieldSet) -> Result<FileDocument, FetchError> {
        (**self).fetch(file_id, fields)
    }
}
