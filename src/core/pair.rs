// tumor/normal pair comparator
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::barcode::{self, BarcodeError};
use crate::core::types::BarcodeConvention;

/// Tumor and normal aliquot barcodes backing one paired-variant file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenPair {
    pub tumor: String,
    pub normal: String,
}

impl SpecimenPair {
    pub fn new(tumor: impl Into<String>, normal: impl Into<String>) -> Self {
        Self {
            tumor: tumor.into(),
            normal: normal.into(),
        }
    }
}

fn pick_barcode<'a>(
    convention: Option<BarcodeConvention>,
    a: &'a str,
    b: &'a str,
) -> Result<&'a str, BarcodeError> {
    match convention {
        Some(convention) => convention.pick(a, b),
        None => Ok(barcode::pick_greatest(a, b)),
    }
}

/// Pick the preferred pair: tumors decide first, then normals.
///
/// Without a convention each barcode falls back to greatest-string-wins.
pub fn pick_pair<'p>(
    convention: Option<BarcodeConvention>,
    first: &'p SpecimenPair,
    second: &'p SpecimenPair,
) -> Result<&'p SpecimenPair, BarcodeError> {
    if first.tumor != second.tumor {
        let chosen = pick_barcode(convention, &first.tumor, &second.tumor)?;
        return Ok(if chosen == first.tumor { first } else { second });
    }
    if first.normal != second.normal {
        let chosen = pick_barcode(convention, &first.normal, &second.normal)?;
        return Ok(if chosen == first.normal { first } else { second });
    }
    warn!(
        tumor = %first.tumor,
        normal = %first.normal,
        "aliquot pairs are identical, unable to make a rational choice"
    );
    Ok(first)
}
