// specimen-barcode comparators
//
// Each comparator picks the preferred of two aliquot barcodes. Both are
// reflexive but NOT transitive over all inputs: the analyte precedence rules
// are a domain convention, not a total order.
use thiserror::Error;
use tracing::warn;

use crate::core::types::BarcodeConvention;

/// `TCGA-BL-A0C8-01A-11<analyte>-<plate>-01`
///
/// ```text
/// TCGA-XX-XXXX-XXV-XXA-XXXX-XX
/// 0         1         2
/// 0123456789012345678901234567
/// ```
pub mod tcga {
    pub const ANALYTE: usize = 19;
    pub const PLATE: std::ops::Range<usize> = 21..25;
    pub const MIN_LEN: usize = 25;
}

/// `TARGET-##-TSS-ABCDEF-TS.TP.N-<portion><analyte>`, offsets from the end.
pub mod target {
    pub const ANALYTE_FROM_END: usize = 1;
    pub const PORTION_START_FROM_END: usize = 3;
    pub const PORTION_END_FROM_END: usize = 1;
    pub const MIN_LEN: usize = 3;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("{convention:?} barcode {barcode:?} is shorter than {needed} characters")]
    TooShort {
        convention: BarcodeConvention,
        barcode: String,
        needed: usize,
    },
    #[error("barcode {0:?} is not ASCII")]
    NotAscii(String),
}

fn greatest<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a >= b { a } else { b }
}

fn check(convention: BarcodeConvention, barcode: &str, needed: usize) -> Result<(), BarcodeError> {
    if !barcode.is_ascii() {
        return Err(BarcodeError::NotAscii(barcode.to_string()));
    }
    if barcode.len() < needed {
        return Err(BarcodeError::TooShort {
            convention,
            barcode: barcode.to_string(),
            needed,
        });
    }
    Ok(())
}

/// Lexicographically greatest wins; used when no convention applies.
pub fn pick_greatest<'a>(a: &'a str, b: &'a str) -> &'a str {
    greatest(a, b)
}

/// TCGA rules (GDAC replicate-sample FAQ):
/// H beats R and T, R beats T, D beats G/W/X unless the other plate is higher,
/// same analyte or anything else falls back to the greatest string.
pub fn pick_tcga<'a>(a: &'a str, b: &'a str) -> Result<&'a str, BarcodeError> {
    if a == b {
        warn!(barcode = %a, "identical barcodes, unable to make a rational choice");
        return Ok(a);
    }
    check(BarcodeConvention::Tcga, a, tcga::MIN_LEN)?;
    check(BarcodeConvention::Tcga, b, tcga::MIN_LEN)?;

    let (x, y) = (a.as_bytes()[tcga::ANALYTE], b.as_bytes()[tcga::ANALYTE]);
    let (plate_a, plate_b) = (&a[tcga::PLATE], &b[tcga::PLATE]);

    let pick = match (x, y) {
        _ if x == y => greatest(a, b),
        (b'H', b'R' | b'T') => a,
        (b'R' | b'T', b'H') => b,
        (b'R', b'T') => a,
        (b'T', b'R') => b,
        (b'D', b'G' | b'W' | b'X') => {
            if plate_b <= plate_a { a } else { b }
        }
        (b'G' | b'W' | b'X', b'D') => {
            if plate_a <= plate_b { b } else { a }
        }
        _ => greatest(a, b),
    };
    Ok(pick)
}

const TARGET_RNA: &[u8] = b"HRST";
const TARGET_DNA_PRECEDENCE: &[u8] = b"DEXYW";

//H over everything, R over S/T; S vs T has no rule
fn target_rna_pick(x: u8, y: u8) -> Option<bool> {
    match (x, y) {
        (b'H', _) => Some(true),
        (_, b'H') => Some(false),
        (b'R', _) => Some(true),
        (_, b'R') => Some(false),
        _ => None,
    }
}

/// TARGET rules: same analyte compares portion then whole string, RNA analytes
/// rank H > R > {S, T}, DNA analytes follow D > E > X > Y > W, anything else
/// (including RNA vs DNA) falls back to the greatest string.
pub fn pick_target<'a>(a: &'a str, b: &'a str) -> Result<&'a str, BarcodeError> {
    if a == b {
        warn!(barcode = %a, "identical barcodes, unable to make a rational choice");
        return Ok(a);
    }
    check(BarcodeConvention::Target, a, target::MIN_LEN)?;
    check(BarcodeConvention::Target, b, target::MIN_LEN)?;

    let analyte = |s: &str| s.as_bytes()[s.len() - target::ANALYTE_FROM_END];
    let portion = |s: &'a str| {
        &s[s.len() - target::PORTION_START_FROM_END..s.len() - target::PORTION_END_FROM_END]
    };
    let (x, y) = (analyte(a), analyte(b));

    if x == y {
        let (pa, pb) = (portion(a), portion(b));
        return Ok(match pa.cmp(pb) {
            std::cmp::Ordering::Greater => a,
            std::cmp::Ordering::Less => b,
            std::cmp::Ordering::Equal => greatest(a, b),
        });
    }

    if TARGET_RNA.contains(&x) && TARGET_RNA.contains(&y) {
        return Ok(match target_rna_pick(x, y) {
            Some(true) => a,
            Some(false) => b,
            None => greatest(a, b),
        });
    }

    let rank = |c: u8| TARGET_DNA_PRECEDENCE.iter().position(|&d| d == c);
    if let (Some(ra), Some(rb)) = (rank(x), rank(y)) {
        return Ok(if ra < rb { a } else { b });
    }

    Ok(greatest(a, b))
}

impl BarcodeConvention {
    pub fn pick<'a>(self, a: &'a str, b: &'a str) -> Result<&'a str, BarcodeError> {
        match self {
            BarcodeConvention::Tcga => pick_tcga(a, b),
            BarcodeConvention::Target => pick_target(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    //TCGA-BL-A0C8-01A-11<analyte>-<plate>-01
    fn tcga(analyte: char, plate: &str) -> String {
        format!("TCGA-BL-A0C8-01A-11{analyte}-{plate}-01")
    }

    fn target(portion: &str, analyte: char) -> String {
        format!("TARGET-20-PABGKN-09A-{portion}{analyte}")
    }

    #[test]
    fn offsets_line_up_with_the_layout() {
        let b = tcga('R', "A277");
        assert_eq!(b.as_bytes()[tcga::ANALYTE], b'R');
        assert_eq!(&b[tcga::PLATE], "A277");
    }

    #[rstest]
    #[case('H', 'R')]
    #[case('H', 'T')]
    #[case('R', 'T')]
    fn tcga_rna_precedence_holds_in_both_orders(#[case] winner: char, #[case] loser: char) {
        let w = tcga(winner, "A000");
        let l = tcga(loser, "Z999");
        assert_eq!(pick_tcga(&w, &l).unwrap(), w);
        assert_eq!(pick_tcga(&l, &w).unwrap(), w);
    }

    #[test]
    fn tcga_d_beats_w_unless_other_plate_is_higher() {
        let d = tcga('D', "A100");
        let w_low = tcga('W', "A050");
        let w_high = tcga('W', "A200");
        let w_same = tcga('W', "A100");

        assert_eq!(pick_tcga(&d, &w_low).unwrap(), d);
        assert_eq!(pick_tcga(&w_low, &d).unwrap(), d);
        assert_eq!(pick_tcga(&d, &w_high).unwrap(), w_high);
        assert_eq!(pick_tcga(&w_high, &d).unwrap(), w_high);
        assert_eq!(pick_tcga(&d, &w_same).unwrap(), d);
        assert_eq!(pick_tcga(&w_same, &d).unwrap(), d);
    }

    #[test]
    fn tcga_same_analyte_prefers_greatest_string() {
        let a = tcga('D', "A100");
        let b = tcga('D', "A200");
        assert_eq!(pick_tcga(&a, &b).unwrap(), b);
        assert_eq!(pick_tcga(&b, &a).unwrap(), b);
    }

    #[test]
    fn tcga_unranked_pairs_fall_back_to_greatest() {
        let g = tcga('G', "A100");
        let x = tcga('X', "A000");
        assert_eq!(pick_tcga(&g, &x).unwrap(), x);
        assert_eq!(pick_tcga(&x, &g).unwrap(), x);
    }

    #[test]
    fn tcga_short_barcode_is_an_error_not_a_panic() {
        let err = pick_tcga("TCGA-BL-A0C8", &tcga('D', "A100")).unwrap_err();
        assert!(matches!(err, BarcodeError::TooShort { needed: 25, .. }));
    }

    #[test]
    fn target_same_analyte_prefers_higher_portion() {
        let low = target("01", 'D');
        let high = target("02", 'D');
        assert_eq!(pick_target(&low, &high).unwrap(), high);
        assert_eq!(pick_target(&high, &low).unwrap(), high);
    }

    #[rstest]
    #[case('D', 'E')]
    #[case('D', 'W')]
    #[case('E', 'X')]
    #[case('E', 'W')]
    #[case('X', 'Y')]
    #[case('Y', 'W')]
    #[case('R', 'S')]
    #[case('H', 'T')]
    fn target_precedence_holds_in_both_orders(#[case] winner: char, #[case] loser: char) {
        let w = target("01", winner);
        let l = target("09", loser);
        assert_eq!(pick_target(&w, &l).unwrap(), w);
        assert_eq!(pick_target(&l, &w).unwrap(), w);
    }

    #[test]
    fn target_cross_class_falls_back_to_greatest() {
        let rna = target("01", 'R');
        let dna = target("01", 'D');
        assert_eq!(pick_target(&rna, &dna).unwrap(), rna);
        assert_eq!(pick_target(&dna, &rna).unwrap(), rna);
    }

    #[test]
    fn convention_dispatch() {
        let w = tcga('H', "A000");
        let l = tcga('T', "A000");
        assert_eq!(BarcodeConvention::Tcga.pick(&l, &w).unwrap(), w);
        assert_eq!(BarcodeConvention::Target.pick("ab", "ab").unwrap(), "ab");
        assert!(BarcodeConvention::Target.pick("ab", "cd").is_err());
    }

    proptest! {
        #[test]
        fn every_comparator_is_reflexive(s in "[ -~]{0,40}") {
            prop_assert_eq!(pick_tcga(&s, &s).unwrap(), s.as_str());
            prop_assert_eq!(pick_target(&s, &s).unwrap(), s.as_str());
            prop_assert_eq!(pick_greatest(&s, &s), s.as_str());
        }

        #[test]
        fn tcga_winner_is_one_of_the_inputs(
            a in "TCGA-[A-Z0-9]{2}-[A-Z0-9]{4}-[0-9]{2}[A-Z]-[0-9]{2}[DGHRTWX]-[A-Z0-9]{4}-[0-9]{2}",
            b in "TCGA-[A-Z0-9]{2}-[A-Z0-9]{4}-[0-9]{2}[A-Z]-[0-9]{2}[DGHRTWX]-[A-Z0-9]{4}-[0-9]{2}",
        ) {
            let w = pick_tcga(&a, &b).unwrap();
            prop_assert!(w == a || w == b);
        }
    }
}
