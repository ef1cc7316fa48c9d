// primary pass: place one manifest file on a participant, sample or pair
use tracing::debug;

use crate::core::collision::CollisionResolver;
use crate::core::graph::{self, CaseInfo, GraphError, SampleInfo};
use crate::core::mapping::AssignError;
use crate::core::run::{IngestError, LoadRun};
use crate::core::sample_type;
use crate::core::slot;
use crate::core::types::{DataCategory, DataType, EntityRef, FileMetadata, FileRef, Program};
use crate::metadata::{CaseDocument, FieldSet, FileDocument, SampleDocument};

/// Where the primary pass put a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Placed(EntityRef),
    /// Spans several cases; handled after the primary pass.
    Deferred { cases: usize },
}

fn required<'d>(file_id: &str, value: Option<&'d str>, field: &'static str) -> Result<&'d str, IngestError> {
    value.ok_or_else(|| IngestError::MissingField {
        file_id: file_id.to_string(),
        field,
    })
}

/// Extract the dispatch fields; category, type, format, access and program are required.
pub(crate) fn file_metadata(file_id: &str, doc: &FileDocument) -> Result<FileMetadata, IngestError> {
    Ok(FileMetadata {
        data_category: DataCategory::parse(required(file_id, doc.data_category.as_deref(), "data_category")?),
        data_type: DataType::parse(required(file_id, doc.data_type.as_deref(), "data_type")?),
        data_format: required(file_id, doc.data_format.as_deref(), "data_format")?.to_string(),
        access: required(file_id, doc.access.as_deref(), "access")?.to_string(),
        experimental_strategy: doc.experimental_strategy.clone(),
        workflow_type: doc.workflow_type().map(str::to_string),
        program: Program::parse(required(file_id, doc.program_name(), "cases.project.program.name")?),
    })
}

pub(crate) fn case_info(file_id: &str, case: &CaseDocument) -> Result<CaseInfo, IngestError> {
    let project_id = case.project.as_ref().and_then(|p| p.project_id.as_deref());
    Ok(CaseInfo {
        case_id: required(file_id, case.case_id.as_deref(), "cases.case_id")?.to_string(),
        submitter_id: required(file_id, case.submitter_id.as_deref(), "cases.submitter_id")?.to_string(),
        project_id: required(file_id, project_id, "cases.project.project_id")?.to_string(),
    })
}

fn sample_info(file_id: &str, sample: &SampleDocument) -> Result<SampleInfo, IngestError> {
    Ok(SampleInfo {
        sample_id: required(file_id, sample.sample_id.as_deref(), "cases.samples.sample_id")?.to_string(),
        submitter_id: required(file_id, sample.submitter_id.as_deref(), "cases.samples.submitter_id")?
            .to_string(),
        sample_type_id: sample.sample_type_id.clone(),
    })
}

//what a single-case file resolves to, before anything is written
enum Plan {
    Participant(CaseInfo),
    Sample(CaseInfo, SampleInfo),
    Pair(CaseInfo, SampleInfo, SampleInfo),
}

impl LoadRun<'_> {
    /// Fetch a manifest file's metadata and attach it to its entity.
    ///
    /// Every check runs before the graph is touched, so a rejected file
    /// leaves no half-created participant or sample behind.
    pub fn ingest_file(&mut self, file: &FileRef) -> Result<Placement, IngestError> {
        let info = self.source.fetch(&file.file_id, FieldSet::FileInfo)?;
        let meta = file_metadata(&file.file_id, &info)?;
        debug!(
            file_id = %file.file_id,
            category = %meta.data_category,
            data_type = %meta.data_type,
            program = %meta.program,
            "file metadata"
        );

        let fields = if meta.data_category.is_case_level() && !meta.is_image() {
            FieldSet::Cases
        } else {
            FieldSet::CasesAndSamples
        };
        let doc = self.source.fetch(&file.file_id, fields)?;

        let case = match doc.cases.as_slice() {
            [] => return Err(IngestError::NoCases { file_id: file.file_id.clone() }),
            [case] => case,
            cases => {
                self.deferred.record(file.clone(), cases.len());
                return Ok(Placement::Deferred { cases: cases.len() });
            }
        };

        let plan = self.plan(file, case)?;
        //surfaces a malformed image name before any entity exists
        slot::slot_for(&meta, &file.filename).map_err(AssignError::from)?;

        let target = match plan {
            Plan::Participant(case) => EntityRef::Participant(self.graph.ensure_participant(&case)),
            Plan::Sample(case, sample) => {
                let participant = self.graph.ensure_participant(&case);
                let (sample_id, _) = self.graph.ensure_sample(&sample, &participant)?;
                EntityRef::Sample(sample_id)
            }
            Plan::Pair(case, a, b) => {
                let participant = self.graph.ensure_participant(&case);
                let first = self.graph.ensure_sample(&a, &participant)?;
                let second = self.graph.ensure_sample(&b, &participant)?;
                let pair = self
                    .graph
                    .ensure_tumor_normal_pair((&first.0, first.1), (&second.0, second.1))?;
                EntityRef::Pair(pair)
            }
        };

        let url = self.urls.url_for(&file.file_id);
        let resolver = CollisionResolver::new(self.source, &self.deferred);
        let outcome = self.graph.assign_file(&target, file, url, &meta, &resolver)?;
        self.summary.record(&outcome);
        Ok(Placement::Placed(target))
    }

    fn plan(&self, file: &FileRef, case: &CaseDocument) -> Result<Plan, IngestError> {
        let info = case_info(&file.file_id, case)?;
        let samples = case.samples.as_deref().unwrap_or_default();
        match samples {
            [] => Ok(Plan::Participant(info)),
            [s] => {
                let sample = sample_info(&file.file_id, s)?;
                sample_type::classify(sample.sample_type_id.as_deref()).map_err(GraphError::from)?;
                Ok(Plan::Sample(info, sample))
            }
            [s1, s2] => {
                let (a, b) = (sample_info(&file.file_id, s1)?, sample_info(&file.file_id, s2)?);
                let class_a = sample_type::classify(a.sample_type_id.as_deref()).map_err(GraphError::from)?;
                let class_b = sample_type::classify(b.sample_type_id.as_deref()).map_err(GraphError::from)?;
                graph::order_tumor_normal((&a.sample_id, class_a), (&b.sample_id, class_b))?;
                Ok(Plan::Pair(info, a, b))
            }
            _ => Err(IngestError::TooManySamples {
                file_id: file.file_id.clone(),
                found: samples.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{mk_case, mk_doc, mk_meta, mk_sample};
    use crate::core::graph::DELETE_PLACEHOLDER;
    use crate::io::resolver::UrlResolver;
    use crate::metadata::{FetchError, MetadataSource, OfflineSource};
    use pretty_assertions::assert_eq;

    fn expression_meta() -> FileMetadata {
        let mut meta = mk_meta("Transcriptome Profiling", "Gene Expression Quantification", "TSV", "TCGA");
        meta.experimental_strategy = Some("RNA-Seq".to_string());
        meta.workflow_type = Some("HTSeq - Counts".to_string());
        meta
    }

    fn ingest<'s>(source: &'s OfflineSource, file: &FileRef) -> (Result<Placement, IngestError>, LoadRun<'s>) {
        let mut run = LoadRun::new(source, UrlResolver::default(), false);
        let out = run.ingest_file(file);
        (out, run)
    }

    #[test]
    fn single_sample_file_lands_on_the_sample() {
        let meta = expression_meta();
        let mut source = OfflineSource::default();
        let case = mk_case("c1", "TCGA", Some(vec![mk_sample("S1", Some("01"), "TCGA-BL-A0C8-01A-11R-A000-07")]));
        source.insert("F1", mk_doc(&meta, vec![case]));

        let file = FileRef::new("F1", "counts.tsv.gz");
        let (out, run) = ingest(&source, &file);

        assert_eq!(out.unwrap(), Placement::Placed(EntityRef::Sample("S1".to_string())));
        let attrs = run.graph().attributes(&EntityRef::Sample("S1".to_string())).unwrap();
        assert_eq!(
            attrs["RNAseq__HTSeqCounts__gene_expression_quantification__tsv__uuid_and_filename"],
            "F1/counts.tsv.gz"
        );
        assert_eq!(
            attrs["RNAseq__HTSeqCounts__gene_expression_quantification__tsv__url"],
            DELETE_PLACEHOLDER
        );
        assert_eq!(run.graph().samples["S1"].participant, "c1");
        assert!(run.graph().participants["c1"].attributes.is_empty());
    }

    #[test]
    fn case_level_file_lands_on_the_participant() {
        let meta = mk_meta("Clinical", "Clinical Supplement", "BCR XML", "TCGA");
        let mut source = OfflineSource::default();
        source.insert("F1", mk_doc(&meta, vec![mk_case("c1", "TCGA", None)]));

        let (out, run) = ingest(&source, &FileRef::new("F1", "clinical.xml"));
        assert_eq!(out.unwrap(), Placement::Placed(EntityRef::Participant("c1".to_string())));
        let p = &run.graph().participants["c1"];
        assert_eq!(p.submitter_id, "SUB-c1");
        assert_eq!(p.project_id, "TCGA-PROJ");
        assert_eq!(p.attributes["clinical_supplement__bcr_xml__uuid_and_filename"], "F1/clinical.xml");
    }

    #[test]
    fn tumor_normal_file_lands_on_the_pair_in_either_order() {
        let meta = mk_meta("Simple Nucleotide Variation", "Raw Simple Somatic Mutation", "VCF", "TCGA");
        let mut source = OfflineSource::default();
        let samples = vec![
            mk_sample("N", Some("10"), "TCGA-BL-A0C8-10A-01D-A000-01"),
            mk_sample("T", Some("01"), "TCGA-BL-A0C8-01A-11D-A000-01"),
        ];
        source.insert("F1", mk_doc(&meta, vec![mk_case("c1", "TCGA", Some(samples))]));

        let (out, run) = ingest(&source, &FileRef::new("F1", "calls.vcf"));
        assert_eq!(out.unwrap(), Placement::Placed(EntityRef::Pair("T_N".to_string())));
        let pair = &run.graph().pairs["T_N"];
        assert_eq!((pair.tumor.as_str(), pair.normal.as_str()), ("T", "N"));
    }

    #[test]
    fn multi_case_file_is_deferred_and_not_placed() {
        let meta = mk_meta("Simple Nucleotide Variation", "Masked Somatic Mutation", "MAF", "TCGA");
        let mut source = OfflineSource::default();
        let cases = ["c1", "c2", "c3"].map(|id| mk_case(id, "TCGA", Some(Vec::new()))).to_vec();
        source.insert("M", mk_doc(&meta, cases));

        let (out, run) = ingest(&source, &FileRef::new("M", "all.maf"));
        assert_eq!(out.unwrap(), Placement::Deferred { cases: 3 });
        assert_eq!(run.deferred().case_count("M"), Some(3));
        assert!(run.graph().participants.is_empty());
    }

    #[test]
    fn rejected_files_leave_the_graph_untouched() {
        let meta = mk_meta("Simple Nucleotide Variation", "Raw Simple Somatic Mutation", "VCF", "TCGA");
        let mut source = OfflineSource::default();
        let two_tumors = vec![
            mk_sample("A", Some("01"), "TCGA-BL-A0C8-01A-11D-A000-01"),
            mk_sample("B", Some("06"), "TCGA-BL-A0C8-06A-11D-A000-01"),
        ];
        source.insert("F1", mk_doc(&meta, vec![mk_case("c1", "TCGA", Some(two_tumors))]));
        let three = ["A", "B", "C"]
            .map(|id| mk_sample(id, Some("01"), "TCGA-BL-A0C8-01A-11D-A000-01"))
            .to_vec();
        source.insert("F2", mk_doc(&meta, vec![mk_case("c1", "TCGA", Some(three))]));
        let unknown = vec![mk_sample("A", Some("77"), "TCGA-BL-A0C8-77A-11D-A000-01")];
        source.insert("F3", mk_doc(&expression_meta(), vec![mk_case("c1", "TCGA", Some(unknown))]));

        let mut run = LoadRun::new(&source, UrlResolver::default(), false);
        let err = run.ingest_file(&FileRef::new("F1", "a.vcf")).unwrap_err();
        assert!(matches!(err, IngestError::Graph(GraphError::NotTumorNormalPair { .. })));
        let err = run.ingest_file(&FileRef::new("F2", "b.vcf")).unwrap_err();
        assert!(matches!(err, IngestError::TooManySamples { found: 3, .. }));
        let err = run.ingest_file(&FileRef::new("F3", "c.tsv")).unwrap_err();
        assert!(matches!(err, IngestError::Graph(GraphError::UnknownSampleType(_))));

        assert_eq!(run.graph(), &crate::core::graph::EntityGraph::new());
    }

    #[test]
    fn missing_required_fields_are_reported_by_name() {
        let mut doc = mk_doc(&expression_meta(), vec![mk_case("c1", "TCGA", None)]);
        doc.access = None;
        assert!(matches!(
            file_metadata("F1", &doc),
            Err(IngestError::MissingField { field: "access", .. })
        ));

        let doc = mk_doc(&expression_meta(), Vec::new());
        assert!(matches!(
            file_metadata("F1", &doc),
            Err(IngestError::MissingField { field: "cases.project.program.name", .. })
        ));
    }

    #[test]
    fn file_without_cases_is_an_error() {
        //program comes from the first case, so serve the two field sets differently
        struct NoCases(FileDocument);
        impl MetadataSource for NoCases {
            fn fetch(&self, _: &str, fields: FieldSet) -> Result<FileDocument, FetchError> {
                match fields {
                    FieldSet::FileInfo => Ok(self.0.clone()),
                    _ => Ok(FileDocument::default()),
                }
            }
        }
        let source = NoCases(mk_doc(&expression_meta(), vec![mk_case("c1", "TCGA", None)]));
        let mut run = LoadRun::new(&source, UrlResolver::default(), false);
        let err = run.ingest_file(&FileRef::new("F1", "x.tsv")).unwrap_err();
        assert!(matches!(err, IngestError::NoCases { .. }));
    }
}
