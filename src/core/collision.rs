// collision resolution: two files claim the same slot on the same entity
//
// The resolver never touches the registry. It only reads metadata and the
// deferred case-count side table, then names the winner.
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::barcode::BarcodeError;
use crate::core::deferred::DeferredCases;
use crate::core::pair::{self, SpecimenPair};
use crate::core::sample_type::{self, TumorNormal, UnknownSampleType};
use crate::core::types::{DataCategory, FileMetadata, FileRef, Program};
use crate::metadata::{FetchError, FieldSet, FileDocument, MetadataSource, SampleDocument};

const DISCOVERY_COHORT: &str = "Discovery";
const VALIDATION_COHORT: &str = "Validation";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("file {file_id} has {found} associated samples, expected {expected}")]
    SampleCount {
        file_id: String,
        expected: usize,
        found: usize,
    },
    #[error("file {file_id} has no associated case")]
    NoCase { file_id: String },
    #[error("file {file_id}: samples are not one tumor and one normal ({first:?}, {second:?})")]
    NotTumorNormal {
        file_id: String,
        first: TumorNormal,
        second: TumorNormal,
    },
    #[error("file {file_id}: sample has no aliquot barcode")]
    MissingBarcode { file_id: String },
    #[error("file {file_id}: {source}")]
    SampleType {
        file_id: String,
        #[source]
        source: UnknownSampleType,
    },
    #[error(transparent)]
    Barcode(#[from] BarcodeError),
}

/// Which resolution rule decided a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Cohort,
    CaseCount,
    SpecimenPair,
    Specimen,
    NoBasis,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Decision<'f> {
    pub winner: &'f FileRef,
    pub rule: Rule,
}

pub struct CollisionResolver<'a> {
    source: &'a dyn MetadataSource,
    deferred: &'a DeferredCases,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(source: &'a dyn MetadataSource, deferred: &'a DeferredCases) -> Self {
        Self { source, deferred }
    }

    /// Pick between `first` (the incoming file) and `second` (the occupant).
    pub fn resolve<'f>(
        &self,
        meta: &FileMetadata,
        first: &'f FileRef,
        second: &'f FileRef,
    ) -> Result<Decision<'f>, ResolveError> {
        let decision = if self.deferred.contains(&first.file_id) || self.deferred.contains(&second.file_id) {
            self.resolve_multi_case(meta, first, second)
        } else if meta.is_paired_variant() {
            self.resolve_paired(meta, first, second)?
        } else {
            self.resolve_single_sample(meta, first, second)?
        };
        info!(
            winner = %decision.winner,
            rule = ?decision.rule,
            "collision resolved"
        );
        Ok(decision)
    }

    //branch 1: at least one side covers several participants
    fn resolve_multi_case<'f>(
        &self,
        meta: &FileMetadata,
        first: &'f FileRef,
        second: &'f FileRef,
    ) -> Decision<'f> {
        if uses_cohort_rule(meta) {
            let (a, b) = (&first.filename, &second.filename);
            if a.contains(DISCOVERY_COHORT) && b.contains(VALIDATION_COHORT) {
                return Decision { winner: first, rule: Rule::Cohort };
            }
            if a.contains(VALIDATION_COHORT) && b.contains(DISCOVERY_COHORT) {
                return Decision { winner: second, rule: Rule::Cohort };
            }
            warn!(
                first = %first,
                second = %second,
                "no cohort criteria for selection, keeping existing file"
            );
            return Decision { winner: second, rule: Rule::NoBasis };
        }

        let count_first = self.deferred.case_count(&first.file_id).unwrap_or(1);
        let count_second = self.deferred.case_count(&second.file_id).unwrap_or(1);
        debug!(
            first = %first.file_id,
            count_first,
            second = %second.file_id,
            count_second,
            "comparing case counts"
        );
        let winner = if count_first >= count_second { first } else { second };
        Decision { winner, rule: Rule::CaseCount }
    }

    //branch 2: variant calls on a tumor/normal pair
    fn resolve_paired<'f>(
        &self,
        meta: &FileMetadata,
        first: &'f FileRef,
        second: &'f FileRef,
    ) -> Result<Decision<'f>, ResolveError> {
        let pair_first = self.specimen_pair(&first.file_id)?;
        let pair_second = self.specimen_pair(&second.file_id)?;
        debug!(file = %first.file_id, tumor = %pair_first.tumor, normal = %pair_first.normal, "aliquot pair");
        debug!(file = %second.file_id, tumor = %pair_second.tumor, normal = %pair_second.normal, "aliquot pair");

        let convention = meta.program.convention();
        if convention.is_none() {
            warn!(program = %meta.program, "no known barcode structure, falling back to greatest barcode");
        }
        let chosen = pair::pick_pair(convention, &pair_first, &pair_second)?;
        let winner = if std::ptr::eq(chosen, &pair_first) { first } else { second };
        Ok(Decision { winner, rule: Rule::SpecimenPair })
    }

    //branch 3: everything else hangs off one sample
    fn resolve_single_sample<'f>(
        &self,
        meta: &FileMetadata,
        first: &'f FileRef,
        second: &'f FileRef,
    ) -> Result<Decision<'f>, ResolveError> {
        let barcode_first = self.specimen(&first.file_id)?;
        let barcode_second = self.specimen(&second.file_id)?;
        debug!(file = %first.file_id, aliquot = %barcode_first, "aliquot");
        debug!(file = %second.file_id, aliquot = %barcode_second, "aliquot");

        if barcode_first == barcode_second {
            warn!(aliquot = %barcode_first, "aliquot ids are identical, unable to make a rational choice");
            return Ok(Decision { winner: first, rule: Rule::NoBasis });
        }

        let Some(convention) = meta.program.convention() else {
            warn!(program = %meta.program, "no known barcode structure, choice is arbitrary");
            return Ok(Decision { winner: first, rule: Rule::NoBasis });
        };

        let chosen = convention.pick(&barcode_first, &barcode_second)?;
        let winner = if chosen == barcode_first { first } else { second };
        Ok(Decision { winner, rule: Rule::Specimen })
    }

    fn samples_of(&self, file_id: &str, fields: FieldSet) -> Result<FileDocument, ResolveError> {
        let doc = self.source.fetch(file_id, fields)?;
        if doc.cases.is_empty() {
            return Err(ResolveError::NoCase { file_id: file_id.to_string() });
        }
        Ok(doc)
    }

    fn specimen_pair(&self, file_id: &str) -> Result<SpecimenPair, ResolveError> {
        let doc = self.samples_of(file_id, FieldSet::TumorNormalSpecimens)?;
        let samples = doc.cases[0].samples.as_deref().unwrap_or_default();
        let [s1, s2] = samples else {
            return Err(ResolveError::SampleCount {
                file_id: file_id.to_string(),
                expected: 2,
                found: samples.len(),
            });
        };

        let classify = |code: Option<&str>| {
            sample_type::classify(code).map_err(|source| ResolveError::SampleType {
                file_id: file_id.to_string(),
                source,
            })
        };
        let barcode = |s: &SampleDocument| {
            s.aliquot_barcode()
                .map(str::to_string)
                .ok_or_else(|| ResolveError::MissingBarcode { file_id: file_id.to_string() })
        };

        let (c1, c2) = (classify(s1.sample_type_id.as_deref())?, classify(s2.sample_type_id.as_deref())?);
        match (c1, c2) {
            (TumorNormal::Tumor, TumorNormal::Normal) => Ok(SpecimenPair::new(barcode(s1)?, barcode(s2)?)),
            (TumorNormal::Normal, TumorNormal::Tumor) => Ok(SpecimenPair::new(barcode(s2)?, barcode(s1)?)),
            (first, second) => Err(ResolveError::NotTumorNormal {
                file_id: file_id.to_string(),
                first,
                second,
            }),
        }
    }

    fn specimen(&self, file_id: &str) -> Result<String, ResolveError> {
        let doc = self.samples_of(file_id, FieldSet::Specimens)?;
        let samples = doc.cases[0].samples.as_deref().unwrap_or_default();
        let [sample] = samples else {
            return Err(ResolveError::SampleCount {
                file_id: file_id.to_string(),
                expected: 1,
                found: samples.len(),
            });
        };
        sample
            .aliquot_barcode()
            .map(str::to_string)
            .ok_or_else(|| ResolveError::MissingBarcode { file_id: file_id.to_string() })
    }
}

/// Whether a collision between `meta`-typed files needs the cohort rule.
pub fn uses_cohort_rule(meta: &FileMetadata) -> bool {
    meta.program == Program::Target
        && matches!(meta.data_category, DataCategory::Clinical | DataCategory::Biospecimen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{mk_case, mk_doc, mk_meta, mk_sample};
    use crate::metadata::OfflineSource;
    use std::cell::RefCell;

    const SNV: (&str, &str, &str) = ("Simple Nucleotide Variation", "Raw Simple Somatic Mutation", "VCF");
    const EXPR: (&str, &str, &str) = ("Transcriptome Profiling", "Gene Expression Quantification", "TSV");

    //records every request so tests can assert what was fetched
    struct Recording {
        inner: OfflineSource,
        calls: RefCell<Vec<(String, FieldSet)>>,
    }

    impl MetadataSource for Recording {
        fn fetch(&self, file_id: &str, fields: FieldSet) -> Result<FileDocument, FetchError> {
            self.calls.borrow_mut().push((file_id.to_string(), fields));
            self.inner.fetch(file_id, fields)
        }
    }

    fn tcga(analyte: char, plate: &str, sample: &str) -> String {
        format!("TCGA-BL-A0C8-{sample}A-11{analyte}-{plate}-01")
    }

    fn paired_source(program: &str, pairs: &[(&str, String, String)]) -> Recording {
        let meta = mk_meta(SNV.0, SNV.1, SNV.2, program);
        let mut inner = OfflineSource::default();
        for (file_id, tumor, normal) in pairs {
            //normal listed first to prove ordering comes from the sample type
            let samples = vec![mk_sample("sn", Some("10"), normal), mk_sample("st", Some("01"), tumor)];
            inner.insert(*file_id, mk_doc(&meta, vec![mk_case("c1", program, Some(samples))]));
        }
        Recording { inner, calls: RefCell::new(Vec::new()) }
    }

    fn single_source(program: &str, files: &[(&str, String)]) -> OfflineSource {
        let meta = mk_meta(EXPR.0, EXPR.1, EXPR.2, program);
        let mut inner = OfflineSource::default();
        for (file_id, barcode) in files {
            let samples = vec![mk_sample("s1", Some("01"), barcode)];
            inner.insert(*file_id, mk_doc(&meta, vec![mk_case("c1", program, Some(samples))]));
        }
        inner
    }

    #[test]
    fn paired_files_are_decided_by_specimen_pairs() {
        //f1 has the better tumor analyte but the lexicographically smaller file id is f0
        let source = paired_source(
            "TCGA",
            &[
                ("f1", tcga('H', "A000", "01"), tcga('D', "A000", "10")),
                ("f0", tcga('T', "A000", "01"), tcga('D', "A000", "10")),
            ],
        );
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta(SNV.0, SNV.1, SNV.2, "TCGA");
        let (new, old) = (FileRef::new("f0", "b.vcf"), FileRef::new("f1", "a.vcf"));

        let d = resolver.resolve(&meta, &new, &old).unwrap();
        assert_eq!(d.winner, &old);
        assert_eq!(d.rule, Rule::SpecimenPair);

        let calls = source.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, f)| *f == FieldSet::TumorNormalSpecimens));
    }

    #[test]
    fn paired_file_with_one_sample_is_an_error() {
        let meta = mk_meta(SNV.0, SNV.1, SNV.2, "TCGA");
        let mut source = OfflineSource::default();
        let one = vec![mk_sample("st", Some("01"), &tcga('D', "A000", "01"))];
        source.insert("f1", mk_doc(&meta, vec![mk_case("c1", "TCGA", Some(one.clone()))]));
        source.insert("f2", mk_doc(&meta, vec![mk_case("c1", "TCGA", Some(one))]));
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);

        let err = resolver
            .resolve(&meta, &FileRef::new("f1", "a"), &FileRef::new("f2", "b"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::SampleCount { expected: 2, found: 1, .. }));
    }

    #[test]
    fn paired_file_with_two_tumors_is_an_error() {
        let meta = mk_meta(SNV.0, SNV.1, SNV.2, "TCGA");
        let mut source = OfflineSource::default();
        let samples = vec![
            mk_sample("a", Some("01"), &tcga('D', "A000", "01")),
            mk_sample("b", Some("02"), &tcga('D', "A000", "02")),
        ];
        source.insert("f1", mk_doc(&meta, vec![mk_case("c1", "TCGA", Some(samples))]));
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);

        let err = resolver
            .resolve(&meta, &FileRef::new("f1", "a"), &FileRef::new("f1", "a"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotTumorNormal { .. }));
    }

    #[test]
    fn single_sample_files_use_the_program_convention() {
        let source = single_source("TCGA", &[("f1", tcga('R', "A000", "01")), ("f2", tcga('H', "A000", "01"))]);
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta(EXPR.0, EXPR.1, EXPR.2, "TCGA");
        let (new, old) = (FileRef::new("f1", "a"), FileRef::new("f2", "b"));

        let d = resolver.resolve(&meta, &new, &old).unwrap();
        assert_eq!(d.winner, &old);
        assert_eq!(d.rule, Rule::Specimen);
    }

    #[test]
    fn identical_specimens_keep_the_first_file() {
        let barcode = tcga('R', "A000", "01");
        let source = single_source("TCGA", &[("f1", barcode.clone()), ("f2", barcode)]);
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta(EXPR.0, EXPR.1, EXPR.2, "TCGA");
        let (new, old) = (FileRef::new("f1", "a"), FileRef::new("f2", "b"));

        let d = resolver.resolve(&meta, &new, &old).unwrap();
        assert_eq!(d.winner, &new);
        assert_eq!(d.rule, Rule::NoBasis);
    }

    #[test]
    fn unknown_program_keeps_the_first_file() {
        let source = single_source("CPTAC", &[("f1", "AAA".to_string()), ("f2", "ZZZ".to_string())]);
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta(EXPR.0, EXPR.1, EXPR.2, "CPTAC");
        let (new, old) = (FileRef::new("f1", "a"), FileRef::new("f2", "b"));

        assert_eq!(resolver.resolve(&meta, &new, &old).unwrap().winner, &new);
    }

    #[test]
    fn deferred_files_compare_case_counts_without_fetching() {
        let source = Recording { inner: OfflineSource::default(), calls: RefCell::new(Vec::new()) };
        let mut deferred = DeferredCases::default();
        deferred.record(FileRef::new("big", "big.maf"), 7);
        deferred.record(FileRef::new("small", "small.maf"), 3);
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta("Simple Nucleotide Variation", "Masked Somatic Mutation", "MAF", "TCGA");

        let (big, small, single) = (
            FileRef::new("big", "big.maf"),
            FileRef::new("small", "small.maf"),
            FileRef::new("single", "single.maf"),
        );
        assert_eq!(resolver.resolve(&meta, &small, &big).unwrap().winner, &big);
        assert_eq!(resolver.resolve(&meta, &big, &small).unwrap().winner, &big);
        //never recorded counts as one case
        assert_eq!(resolver.resolve(&meta, &single, &small).unwrap().winner, &small);
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn case_count_ties_keep_the_first_file() {
        let source = OfflineSource::default();
        let mut deferred = DeferredCases::default();
        deferred.record(FileRef::new("a", "a"), 4);
        deferred.record(FileRef::new("b", "b"), 4);
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta(EXPR.0, EXPR.1, EXPR.2, "TCGA");
        let (a, b) = (FileRef::new("a", "a"), FileRef::new("b", "b"));
        assert_eq!(resolver.resolve(&meta, &a, &b).unwrap().winner, &a);
    }

    #[test]
    fn target_clinical_prefers_discovery_cohort() {
        let source = OfflineSource::default();
        let mut deferred = DeferredCases::default();
        let discovery = FileRef::new("d", "TARGET_AML_ClinicalData_Discovery_20170525.xlsx");
        let validation = FileRef::new("v", "TARGET_AML_ClinicalData_Validation_20170525.xlsx");
        let other = FileRef::new("o", "TARGET_AML_ClinicalData_20170525.xlsx");
        deferred.record(discovery.clone(), 200);
        deferred.record(validation.clone(), 900);
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta("Clinical", "Clinical Supplement", "XLSX", "TARGET");

        let d = resolver.resolve(&meta, &discovery, &validation).unwrap();
        assert_eq!((d.winner, d.rule), (&discovery, Rule::Cohort));
        let d = resolver.resolve(&meta, &validation, &discovery).unwrap();
        assert_eq!((d.winner, d.rule), (&discovery, Rule::Cohort));

        //no cohort marker on one side: keep the occupant
        let d = resolver.resolve(&meta, &other, &validation).unwrap();
        assert_eq!((d.winner, d.rule), (&validation, Rule::NoBasis));
    }

    #[test]
    fn fetch_failures_surface_as_errors() {
        let source = OfflineSource::default();
        let deferred = DeferredCases::default();
        let resolver = CollisionResolver::new(&source, &deferred);
        let meta = mk_meta(EXPR.0, EXPR.1, EXPR.2, "TCGA");
        let err = resolver
            .resolve(&meta, &FileRef::new("x", "x"), &FileRef::new("y", "y"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(FetchError::NotFound(_))));
    }
}
