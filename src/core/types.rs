// shared identifiers + closed enumerations for the rule set
use std::fmt;

use serde::{Deserialize, Serialize};

pub type CaseId = String;
pub type SampleId = String;
pub type PairId = String;

/// Which table an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Participant,
    Sample,
    Pair,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Participant => "participant",
            EntityKind::Sample => "sample",
            EntityKind::Pair => "pair",
        }
    }
}

/// Key of one entity in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Participant(CaseId),
    Sample(SampleId),
    Pair(PairId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Participant(_) => EntityKind::Participant,
            EntityRef::Sample(_) => EntityKind::Sample,
            EntityRef::Pair(_) => EntityKind::Pair,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            EntityRef::Participant(k) | EntityRef::Sample(k) | EntityRef::Pair(k) => k,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.key())
    }
}

/// One manifest row: opaque file id plus its filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    pub filename: String,
}

impl FileRef {
    pub const SEPARATOR: char = '/';

    pub fn new(file_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            filename: filename.into(),
        }
    }

    /// `fileId/filename`, the value stored in a reference attribute.
    pub fn to_reference(&self) -> String {
        format!("{}{}{}", self.file_id, Self::SEPARATOR, self.filename)
    }

    //split on the first separator; file ids never contain one
    pub fn parse_reference(value: &str) -> Option<Self> {
        let (file_id, filename) = value.split_once(Self::SEPARATOR)?;
        Some(Self::new(file_id, filename))
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_reference())
    }
}

/// Specimen-identifier naming conventions with known internal structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeConvention {
    /// `TCGA-XX-XXXX-XXV-XXA-XXXX-XX`
    Tcga,
    /// `TARGET-##-TSS-ABCDEF-TS.TP.N-<portion><analyte>`
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    Tcga,
    Target,
    Fm,
    Other(String),
}

impl Program {
    pub fn parse(name: &str) -> Self {
        match name {
            "TCGA" => Program::Tcga,
            "TARGET" => Program::Target,
            "FM" => Program::Fm,
            other => Program::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Program::Tcga => "TCGA",
            Program::Target => "TARGET",
            Program::Fm => "FM",
            Program::Other(name) => name,
        }
    }

    /// `None` when the program's identifiers carry no structure we can rank on.
    pub fn convention(&self) -> Option<BarcodeConvention> {
        match self {
            Program::Tcga => Some(BarcodeConvention::Tcga),
            Program::Target => Some(BarcodeConvention::Target),
            Program::Fm | Program::Other(_) => None,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataCategory {
    SimpleNucleotideVariation,
    TranscriptomeProfiling,
    Biospecimen,
    RawSequencingData,
    CopyNumberVariation,
    Clinical,
    DnaMethylation,
    CombinedNucleotideVariation,
    Other(String),
}

impl DataCategory {
    pub fn parse(value: &str) -> Self {
        match value {
            "Simple Nucleotide Variation" => DataCategory::SimpleNucleotideVariation,
            "Transcriptome Profiling" => DataCategory::TranscriptomeProfiling,
            "Biospecimen" => DataCategory::Biospecimen,
            "Raw Sequencing Data" => DataCategory::RawSequencingData,
            "Copy Number Variation" => DataCategory::CopyNumberVariation,
            "Clinical" => DataCategory::Clinical,
            "DNA Methylation" => DataCategory::DnaMethylation,
            "Combined Nucleotide Variation" => DataCategory::CombinedNucleotideVariation,
            other => DataCategory::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataCategory::SimpleNucleotideVariation => "Simple Nucleotide Variation",
            DataCategory::TranscriptomeProfiling => "Transcriptome Profiling",
            DataCategory::Biospecimen => "Biospecimen",
            DataCategory::RawSequencingData => "Raw Sequencing Data",
            DataCategory::CopyNumberVariation => "Copy Number Variation",
            DataCategory::Clinical => "Clinical",
            DataCategory::DnaMethylation => "DNA Methylation",
            DataCategory::CombinedNucleotideVariation => "Combined Nucleotide Variation",
            DataCategory::Other(value) => value,
        }
    }

    /// Clinical and Biospecimen files hang off participants rather than samples.
    pub fn is_case_level(&self) -> bool {
        matches!(self, DataCategory::Clinical | DataCategory::Biospecimen)
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    //simple nucleotide variation
    RawSimpleSomaticMutation,
    AnnotatedSomaticMutation,
    AggregatedSomaticMutation,
    MaskedSomaticMutation,
    //transcriptome profiling
    MirnaExpressionQuantification,
    IsoformExpressionQuantification,
    GeneExpressionQuantification,
    //biospecimen
    BiospecimenSupplement,
    SlideImage,
    //raw sequencing data
    AlignedReads,
    //copy number variation
    CopyNumberSegment,
    MaskedCopyNumberSegment,
    //clinical
    ClinicalSupplement,
    //dna methylation
    MethylationBetaValue,
    //combined nucleotide variation
    RawCgiVariant,
    Other(String),
}

impl DataType {
    pub fn parse(value: &str) -> Self {
        match value {
            "Raw Simple Somatic Mutation" => DataType::RawSimpleSomaticMutation,
            "Annotated Somatic Mutation" => DataType::AnnotatedSomaticMutation,
            "Aggregated Somatic Mutation" => DataType::AggregatedSomaticMutation,
            "Masked Somatic Mutation" => DataType::MaskedSomaticMutation,
            "miRNA Expression Quantification" => DataType::MirnaExpressionQuantification,
            "Isoform Expression Quantification" => DataType::IsoformExpressionQuantification,
            "Gene Expression Quantification" => DataType::GeneExpressionQuantification,
            "Biospecimen Supplement" => DataType::BiospecimenSupplement,
            "Slide Image" => DataType::SlideImage,
            "Aligned Reads" => DataType::AlignedReads,
            "Copy Number Segment" => DataType::CopyNumberSegment,
            "Masked Copy Number Segment" => DataType::MaskedCopyNumberSegment,
            "Clinical Supplement" => DataType::ClinicalSupplement,
            "Methylation Beta Value" => DataType::MethylationBetaValue,
            "Raw CGI Variant" => DataType::RawCgiVariant,
            other => DataType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataType::RawSimpleSomaticMutation => "Raw Simple Somatic Mutation",
            DataType::AnnotatedSomaticMutation => "Annotated Somatic Mutation",
            DataType::AggregatedSomaticMutation => "Aggregated Somatic Mutation",
            DataType::MaskedSomaticMutation => "Masked Somatic Mutation",
            DataType::MirnaExpressionQuantification => "miRNA Expression Quantification",
            DataType::IsoformExpressionQuantification => "Isoform Expression Quantification",
            DataType::GeneExpressionQuantification => "Gene Expression Quantification",
            DataType::BiospecimenSupplement => "Biospecimen Supplement",
            DataType::SlideImage => "Slide Image",
            DataType::AlignedReads => "Aligned Reads",
            DataType::CopyNumberSegment => "Copy Number Segment",
            DataType::MaskedCopyNumberSegment => "Masked Copy Number Segment",
            DataType::ClinicalSupplement => "Clinical Supplement",
            DataType::MethylationBetaValue => "Methylation Beta Value",
            DataType::RawCgiVariant => "Raw CGI Variant",
            DataType::Other(value) => value,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data format of the multi-case tabular supplements that are never fanned out.
pub const BULK_SUPPLEMENT_FORMAT: &str = "BCR Biotab";

/// The file-level fields every placement decision dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub data_category: DataCategory,
    pub data_type: DataType,
    pub data_format: String,
    pub access: String,
    pub experimental_strategy: Option<String>,
    pub workflow_type: Option<String>,
    pub program: Program,
}

impl FileMetadata {
    pub fn is_image(&self) -> bool {
        self.data_type == DataType::SlideImage
    }

    /// Files that describe a tumor/normal pair of samples rather than one sample.
    pub fn is_paired_variant(&self) -> bool {
        match self.data_category {
            DataCategory::SimpleNucleotideVariation => !matches!(
                self.data_type,
                DataType::AggregatedSomaticMutation | DataType::MaskedSomaticMutation
            ),
            DataCategory::CombinedNucleotideVariation => true,
            _ => false,
        }
    }

    /// Clinical/Biospecimen supplements covering many participants in one table.
    pub fn is_bulk_supplement(&self) -> bool {
        let supplement = matches!(
            (&self.data_category, &self.data_type),
            (DataCategory::Biospecimen, DataType::BiospecimenSupplement)
                | (DataCategory::Clinical, DataType::ClinicalSupplement)
        );
        supplement && self.data_format == BULK_SUPPLEMENT_FORMAT
    }
}
