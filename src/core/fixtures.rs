// metadata document builders shared by the unit tests
use crate::core::types::{DataCategory, DataType, FileMetadata, Program};
use crate::metadata::{
    AliquotDocument, Analysis, AnalyteDocument, CaseDocument, FileDocument, PortionDocument,
    ProgramDocument, ProjectDocument, SampleDocument,
};

pub fn mk_meta(category: &str, data_type: &str, format: &str, program: &str) -> FileMetadata {
    FileMetadata {
        data_category: DataCategory::parse(category),
        data_type: DataType::parse(data_type),
        data_format: format.to_string(),
        access: "controlled".to_string(),
        experimental_strategy: None,
        workflow_type: None,
        program: Program::parse(program),
    }
}

pub fn mk_sample(sample_id: &str, type_code: Option<&str>, barcode: &str) -> SampleDocument {
    SampleDocument {
        sample_id: Some(sample_id.to_string()),
        submitter_id: Some(format!("SUB-{sample_id}")),
        sample_type_id: type_code.map(str::to_string),
        sample_type: None,
        portions: vec![PortionDocument {
            analytes: vec![AnalyteDocument {
                aliquots: vec![AliquotDocument {
                    submitter_id: Some(barcode.to_string()),
                }],
            }],
        }],
    }
}

pub fn mk_case(case_id: &str, program: &str, samples: Option<Vec<SampleDocument>>) -> CaseDocument {
    CaseDocument {
        case_id: Some(case_id.to_string()),
        submitter_id: Some(format!("SUB-{case_id}")),
        project: Some(ProjectDocument {
            project_id: Some(format!("{program}-PROJ")),
            program: Some(ProgramDocument {
                name: Some(program.to_string()),
            }),
        }),
        samples,
    }
}

/// A full document: file-level fields plus the given cases.
pub fn mk_doc(meta: &FileMetadata, cases: Vec<CaseDocument>) -> FileDocument {
    FileDocument {
        data_category: Some(meta.data_category.as_str().to_string()),
        data_type: Some(meta.data_type.as_str().to_string()),
        data_format: Some(meta.data_format.clone()),
        access: Some(meta.access.clone()),
        experimental_strategy: meta.experimental_strategy.clone(),
        analysis: meta.workflow_type.clone().map(|w| Analysis {
            workflow_type: Some(w),
        }),
        cases,
    }
}
