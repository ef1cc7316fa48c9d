// sample-type codes -> tumor/normal classification
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TumorNormal {
    Tumor,
    Normal,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTypeInfo {
    pub code: &'static str,
    pub description: &'static str,
    pub letter_code: &'static str,
    pub class: TumorNormal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sample type code {0:?}")]
pub struct UnknownSampleType(pub String);

const fn entry(
    code: &'static str,
    description: &'static str,
    letter_code: &'static str,
    class: TumorNormal,
) -> SampleTypeInfo {
    SampleTypeInfo { code, description, letter_code, class }
}

use TumorNormal::{Normal, Tumor, Unspecified};

//GDC sample type code table, sorted by code
pub const SAMPLE_TYPES: &[SampleTypeInfo] = &[
    entry("01", "Primary Solid Tumor", "TP", Tumor),
    entry("02", "Recurrent Solid Tumor", "TR", Tumor),
    entry("03", "Primary Blood Derived Cancer - Peripheral Blood", "TB", Tumor),
    entry("04", "Recurrent Blood Derived Cancer - Bone Marrow", "TRBM", Tumor),
    entry("05", "Additional - New Primary", "TAP", Tumor),
    entry("06", "Metastatic", "TM", Tumor),
    entry("07", "Additional Metastatic", "TAM", Tumor),
    entry("08", "Human Tumor Original Cells", "THOC", Tumor),
    entry("09", "Primary Blood Derived Cancer - Bone Marrow", "TBM", Tumor),
    entry("10", "Blood Derived Normal", "NB", Normal),
    entry("11", "Solid Tissue Normal", "NT", Normal),
    entry("12", "Buccal Cell Normal", "NBC", Normal),
    entry("13", "EBV Immortalized Normal", "NEBV", Normal),
    entry("14", "Bone Marrow Normal", "NBM", Normal),
    entry("15", "sample type 15", "15SH", Unspecified),
    entry("16", "sample type 16", "16SH", Unspecified),
    entry("20", "Control Analyte", "CELLC", Unspecified),
    entry("40", "Recurrent Blood Derived Normal - Peripheral Blood", "TRB", Normal),
    entry("41", "Blood Derived Cancer - Bone Marrow, Post-treatment", "TBD", Tumor),
    entry("42", "Blood Derived Cancer - Peripheral Blood, Post-treatment", "TBD", Tumor),
    entry("50", "Cell Lines", "CELL", Unspecified),
    entry("60", "Primary Xenograft Tissue", "XP", Unspecified),
    entry("61", "Cell Line Derived Xenograft Tissue", "XCL", Unspecified),
    entry("99", "sample type 99", "99SH", Unspecified),
];

pub fn lookup(code: &str) -> Result<&'static SampleTypeInfo, UnknownSampleType> {
    SAMPLE_TYPES
        .binary_search_by(|info| info.code.cmp(code))
        .map(|idx| &SAMPLE_TYPES[idx])
        .map_err(|_| UnknownSampleType(code.to_string()))
}

/// Classify a sample from its (optional) sample-type code.
///
/// Some programs (FM) never report a sample type; their specimens are tumor by
/// program design, so a missing code classifies as tumor.
pub fn classify(code: Option<&str>) -> Result<TumorNormal, UnknownSampleType> {
    match code {
        Some(code) => lookup(code).map(|info| info.class),
        None => Ok(TumorNormal::Tumor),
    }
}

pub fn letter_code(code: Option<&str>) -> Option<&'static str> {
    code.and_then(|c| lookup(c).ok()).map(|info| info.letter_code)
}
