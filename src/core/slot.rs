// attribute-slot naming: a pure function of the file's metadata
use thiserror::Error;

use crate::core::types::FileMetadata;

const EXPERIMENTAL_STRATEGY_ABBREVIATIONS: &[(&str, &str)] = &[
    ("WXS", "WXS"),
    ("RNA-Seq", "RNAseq"),
    ("Genotyping Array", "GeneArray"),
    ("Targeted Sequencing", "TargetedSeq"),
    ("miRNA-Seq", "miRNAseq"),
    ("Tissue Slide", "TissueSlide"),
    ("Methylation Array", "MethArray"),
    ("Diagnostic Slide", "DiagSlide"),
    ("WGS", "WGS"),
];

const WORKFLOW_ABBREVIATIONS: &[(&str, &str)] = &[
    ("DNACopy", "DNACopy"),
    ("BCGSC miRNA Profiling", "BCGSCmiRNA"),
    ("BWA with Mark Duplicates and Cocleaning", "BWAMDupCoClean"),
    ("FM Simple Somatic Mutation", "FMSimpleSomaticMutation"),
    ("FoundationOne Annotation", "F1Annotation"),
    ("Liftover", "Lift"),
    ("STAR 2-Pass", "STAR2Pass"),
    ("HTSeq - Counts", "HTSeqCounts"),
    ("HTSeq - FPKM", "HTSeqFPKM"),
    ("HTSeq - FPKM-UQ", "HTSEQFPKMUQ"),
    ("BWA-aln", "BWAaln"),
    ("SomaticSniper", "SomSnip"),
    ("SomaticSniper Annotation", "SomSnipAnnot"),
    ("MuTect2", "MuTect2"),
    ("MuTect2 Annotation", "MuTect2Annot"),
    ("VarScan2", "VarScan2"),
    ("VarScan2 Annotation", "VarScan2Annot"),
    ("MuSE", "MuSE"),
    ("MuSE Annotation", "MuSEAnnot"),
    ("VCF LiftOver", "VCFLift"),
    ("MuSE Variant Aggregation and Masking", "MuSEAggrMask"),
    ("MuTect2 Variant Aggregation and Masking", "MuTect2AggrMask"),
    ("SomaticSniper Variant Aggregation and Masking", "SomSnipAggrMask"),
    ("VarScan2 Variant Aggregation and Masking", "VarScan2AggrMask"),
    ("FoundationOne Variant Aggregation and Masking", "F1AggrMask"),
];

const FIELD_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("image filename {0:?} has no <portion>-<code> suffix")]
    MalformedImageName(String),
    #[error("image filename {filename:?} has non-numeric portion {portion:?}")]
    BadPortion { filename: String, portion: String },
}

/// Computed slot for one file. `portion` is set for image files only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub base: String,
    pub portion: Option<u32>,
}

/// Image code and portion number embedded in a slide-image filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub code: String,
    pub portion: u32,
}

//table hit, else strip '.', '-', ' ' and '_'
fn abbreviate(table: &[(&str, &str)], value: &str) -> String {
    match table.iter().find(|(long, _)| *long == value) {
        Some((_, short)) => (*short).to_string(),
        None => value.chars().filter(|c| !matches!(c, '.' | '-' | ' ' | '_')).collect(),
    }
}

fn snake_lower(value: &str) -> String {
    value.to_lowercase().replace(' ', "_")
}

fn prefix(meta: &FileMetadata) -> String {
    let mut out = String::new();
    if let Some(strategy) = &meta.experimental_strategy {
        out.push_str(&abbreviate(EXPERIMENTAL_STRATEGY_ABBREVIATIONS, strategy));
        out.push_str(FIELD_SEPARATOR);
    }
    if let Some(workflow) = &meta.workflow_type {
        out.push_str(&abbreviate(WORKFLOW_ABBREVIATIONS, workflow));
        out.push_str(FIELD_SEPARATOR);
    }
    out
}

/// Slot base for non-image files: strategy, workflow, data type, data format.
pub fn slot_base(meta: &FileMetadata) -> String {
    let mut base = prefix(meta);
    base.push_str(&snake_lower(meta.data_type.as_str()));
    base.push_str(FIELD_SEPARATOR);
    base.push_str(&snake_lower(&meta.data_format));
    base.push_str(FIELD_SEPARATOR);
    base
}

/// Parse `...-<portion>-<code>.<rest>` out of a slide-image filename.
///
/// e.g. `TCGA-AA-3495-01Z-00-DX1.8C0C9F83.svs` -> (`DX1`, 0)
pub fn image_tag(filename: &str) -> Result<ImageTag, SlotError> {
    let stem = filename.split('.').next().unwrap_or(filename);
    let mut tokens = stem.rsplit('-');
    let (code, portion) = match (tokens.next(), tokens.next()) {
        (Some(code), Some(portion)) if !code.is_empty() => (code, portion),
        _ => return Err(SlotError::MalformedImageName(filename.to_string())),
    };
    let portion = portion.parse::<u32>().map_err(|_| SlotError::BadPortion {
        filename: filename.to_string(),
        portion: portion.to_string(),
    })?;
    Ok(ImageTag { code: code.to_string(), portion })
}

/// Slot base for image files: strategy, workflow, image code, data type.
pub fn image_slot_base(meta: &FileMetadata, filename: &str) -> Result<(String, u32), SlotError> {
    let tag = image_tag(filename)?;
    let mut base = prefix(meta);
    base.push_str(&tag.code.to_lowercase());
    base.push_str(FIELD_SEPARATOR);
    base.push_str(&snake_lower(meta.data_type.as_str()));
    base.push_str(FIELD_SEPARATOR);
    Ok((base, tag.portion))
}

pub fn slot_for(meta: &FileMetadata, filename: &str) -> Result<Slot, SlotError> {
    if meta.is_image() {
        let (base, portion) = image_slot_base(meta, filename)?;
        Ok(Slot { base, portion: Some(portion) })
    } else {
        Ok(Slot { base: slot_base(meta), portion: None })
    }
}
