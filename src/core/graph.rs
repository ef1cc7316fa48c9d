// the entity registry: participants, samples, tumor/normal pairs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::sample_type::{self, TumorNormal, UnknownSampleType};
use crate::core::types::{CaseId, EntityRef, FileRef, PairId, SampleId};

/// Suffix of the attribute holding `fileId/filename`.
pub const REFERENCE_SUFFIX: &str = "uuid_and_filename";
/// Suffix of the attribute holding the file URL.
pub const URL_SUFFIX: &str = "url";
/// Placeholder written where a value is unknown.
pub const DELETE_PLACEHOLDER: &str = "__DELETE__";

pub type Attributes = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub submitter_id: String,
    pub project_id: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub submitter_id: String,
    pub sample_type_id: Option<String>,
    pub participant: CaseId,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub tumor: SampleId,
    pub normal: SampleId,
    pub attributes: Attributes,
}

/// Identity fields of a case as reported by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInfo {
    pub case_id: CaseId,
    pub submitter_id: String,
    pub project_id: String,
}

/// Identity fields of a sample as reported by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleInfo {
    pub sample_id: SampleId,
    pub submitter_id: String,
    pub sample_type_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("participant not found: {0}")]
    ParticipantNotFound(CaseId),
    #[error("sample not found: {0}")]
    SampleNotFound(SampleId),
    #[error("pair not found: {0}")]
    PairNotFound(PairId),
    #[error("samples {first} ({first_class:?}) and {second} ({second_class:?}) are not a tumor/normal pair")]
    NotTumorNormalPair {
        first: SampleId,
        first_class: TumorNormal,
        second: SampleId,
        second_class: TumorNormal,
    },
    #[error(transparent)]
    UnknownSampleType(#[from] UnknownSampleType),
}

/// Process-scoped registry of every entity a run has discovered.
///
/// Entities are created lazily and never removed. Maps keep insertion order so
/// emitted tables follow manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGraph {
    pub participants: IndexMap<CaseId, Participant>,
    pub samples: IndexMap<SampleId, Sample>,
    pub pairs: IndexMap<PairId, Pair>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    //insert-if-absent, never overwrites a known participant
    pub fn ensure_participant(&mut self, case: &CaseInfo) -> CaseId {
        self.participants
            .entry(case.case_id.clone())
            .or_insert_with(|| Participant {
                submitter_id: case.submitter_id.clone(),
                project_id: case.project_id.clone(),
                attributes: Attributes::new(),
            });
        case.case_id.clone()
    }

    /// Insert a sample under `participant` if new, and classify it.
    ///
    /// The owning participant is fixed the first time a sample is seen.
    pub fn ensure_sample(
        &mut self,
        sample: &SampleInfo,
        participant: &CaseId,
    ) -> Result<(SampleId, TumorNormal), GraphError> {
        let class = sample_type::classify(sample.sample_type_id.as_deref())?;
        self.samples
            .entry(sample.sample_id.clone())
            .or_insert_with(|| Sample {
                submitter_id: sample.submitter_id.clone(),
                sample_type_id: sample.sample_type_id.clone(),
                participant: participant.clone(),
                attributes: Attributes::new(),
            });
        Ok((sample.sample_id.clone(), class))
    }

    pub fn pair_key(tumor: &str, normal: &str) -> PairId {
        format!("{tumor}_{normal}")
    }

    pub fn ensure_pair(&mut self, tumor: &SampleId, normal: &SampleId) -> PairId {
        let key = Self::pair_key(tumor, normal);
        self.pairs.entry(key.clone()).or_insert_with(|| Pair {
            tumor: tumor.clone(),
            normal: normal.clone(),
            attributes: Attributes::new(),
        });
        key
    }

    /// Build the pair for two classified samples, in whichever order they arrive.
    pub fn ensure_tumor_normal_pair(
        &mut self,
        first: (&SampleId, TumorNormal),
        second: (&SampleId, TumorNormal),
    ) -> Result<PairId, GraphError> {
        let (tumor, normal) = order_tumor_normal(first, second)?;
        Ok(self.ensure_pair(tumor, normal))
    }

    pub fn attributes(&self, entity: &EntityRef) -> Result<&Attributes, GraphError> {
        match entity {
            EntityRef::Participant(k) => self
                .participants
                .get(k)
                .map(|p| &p.attributes)
                .ok_or_else(|| GraphError::ParticipantNotFound(k.clone())),
            EntityRef::Sample(k) => self
                .samples
                .get(k)
                .map(|s| &s.attributes)
                .ok_or_else(|| GraphError::SampleNotFound(k.clone())),
            EntityRef::Pair(k) => self
                .pairs
                .get(k)
                .map(|p| &p.attributes)
                .ok_or_else(|| GraphError::PairNotFound(k.clone())),
        }
    }

    fn attributes_mut(&mut self, entity: &EntityRef) -> Result<&mut Attributes, GraphError> {
        match entity {
            EntityRef::Participant(k) => self
                .participants
                .get_mut(k)
                .map(|p| &mut p.attributes)
                .ok_or_else(|| GraphError::ParticipantNotFound(k.clone())),
            EntityRef::Sample(k) => self
                .samples
                .get_mut(k)
                .map(|s| &mut s.attributes)
                .ok_or_else(|| GraphError::SampleNotFound(k.clone())),
            EntityRef::Pair(k) => self
                .pairs
                .get_mut(k)
                .map(|p| &mut p.attributes)
                .ok_or_else(|| GraphError::PairNotFound(k.clone())),
        }
    }

    /// The file currently occupying `slot_base` on `entity`, if any.
    pub fn occupant(&self, entity: &EntityRef, slot_base: &str) -> Result<Option<FileRef>, GraphError> {
        let attrs = self.attributes(entity)?;
        Ok(attrs
            .get(&reference_attribute(slot_base))
            .and_then(|v| FileRef::parse_reference(v)))
    }

    /// Write the reference and URL attributes for `slot_base`.
    ///
    /// Last write wins: callers arbitrate collisions before calling this.
    pub fn set_attribute(
        &mut self,
        entity: &EntityRef,
        slot_base: &str,
        file: &FileRef,
        file_url: &str,
    ) -> Result<(), GraphError> {
        let attrs = self.attributes_mut(entity)?;
        attrs.insert(reference_attribute(slot_base), file.to_reference());
        attrs.insert(url_attribute(slot_base), file_url.to_string());
        Ok(())
    }
}

pub fn reference_attribute(slot_base: &str) -> String {
    format!("{slot_base}{REFERENCE_SUFFIX}")
}

pub fn url_attribute(slot_base: &str) -> String {
    format!("{slot_base}{URL_SUFFIX}")
}

/// Order two classified samples as (tumor, normal); anything else is rejected.
pub fn order_tumor_normal<'a>(
    first: (&'a SampleId, TumorNormal),
    second: (&'a SampleId, TumorNormal),
) -> Result<(&'a SampleId, &'a SampleId), GraphError> {
    match (first.1, second.1) {
        (TumorNormal::Tumor, TumorNormal::Normal) => Ok((first.0, second.0)),
        (TumorNormal::Normal, TumorNormal::Tumor) => Ok((second.0, first.0)),
        (first_class, second_class) => Err(GraphError::NotTumorNormalPair {
            first: first.0.clone(),
            first_class,
            second: second.0.clone(),
            second_class,
        }),
    }
}
