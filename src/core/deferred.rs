// multi-case files: recorded during the primary pass, fanned out afterwards
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::core::collision::CollisionResolver;
use crate::core::graph::CaseInfo;
use crate::core::propagate::{case_info, file_metadata};
use crate::core::run::{IngestError, LoadRun};
use crate::core::types::{EntityRef, FileRef};
use crate::metadata::FieldSet;

/// Case counts of every deferred file, plus the files in deferral order.
///
/// Owned by the run and shared by reference with the collision resolver.
#[derive(Debug, Clone, Default)]
pub struct DeferredCases {
    counts: HashMap<String, usize>,
    queue: Vec<FileRef>,
}

impl DeferredCases {
    pub fn record(&mut self, file: FileRef, cases: usize) {
        if self.counts.insert(file.file_id.clone(), cases).is_none() {
            self.queue.push(file);
        }
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.counts.contains_key(file_id)
    }

    pub fn case_count(&self, file_id: &str) -> Option<usize> {
        self.counts.get(file_id).copied()
    }

    pub fn queue(&self) -> &[FileRef] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredOutcome {
    /// Bulk multi-case supplement; excluded from the data model.
    Skipped,
    /// Number of entities the file was offered to.
    Attached(usize),
}

impl LoadRun<'_> {
    /// Fan one deferred file out to the participants/samples already known.
    pub fn process_deferred_file(&mut self, file: &FileRef) -> Result<DeferredOutcome, IngestError> {
        let info = self.source.fetch(&file.file_id, FieldSet::FileInfo)?;
        let meta = file_metadata(&file.file_id, &info)?;

        if meta.is_bulk_supplement() {
            info!(file_id = %file.file_id, format = %meta.data_format, "skipping bulk supplement");
            return Ok(DeferredOutcome::Skipped);
        }

        let fields = if meta.data_category.is_case_level() {
            FieldSet::Cases
        } else {
            FieldSet::CasesAndSamples
        };
        let doc = self.source.fetch(&file.file_id, fields)?;
        if doc.cases.is_empty() {
            return Err(IngestError::NoCases { file_id: file.file_id.clone() });
        }

        //plan every target before touching the graph
        let mut new_cases: Vec<CaseInfo> = Vec::new();
        let mut targets: Vec<EntityRef> = Vec::new();
        for case in &doc.cases {
            let case_id = case.case_id.as_deref().ok_or_else(|| IngestError::MissingField {
                file_id: file.file_id.clone(),
                field: "cases.case_id",
            })?;
            let known = self.graph.participants.contains_key(case_id);
            if !(self.all_cases || known) {
                debug!(%case_id, "case not in registry, skipping");
                continue;
            }
            if !known {
                new_cases.push(case_info(&file.file_id, case)?);
            }
            match &case.samples {
                Some(samples) => targets.extend(
                    samples
                        .iter()
                        .filter_map(|s| s.sample_id.as_ref())
                        .filter(|id| self.graph.samples.contains_key(*id))
                        .map(|id| EntityRef::Sample(id.clone())),
                ),
                None => targets.push(EntityRef::Participant(case_id.to_string())),
            }
        }

        for info in &new_cases {
            self.graph.ensure_participant(info);
        }

        let url = self.urls.url_for(&file.file_id);
        let resolver = CollisionResolver::new(self.source, &self.deferred);
        for target in &targets {
            let outcome = self.graph.assign_file(target, file, url, &meta, &resolver)?;
            self.summary.record(&outcome);
        }
        Ok(DeferredOutcome::Attached(targets.len()))
    }

    /// Process the deferred queue in deferral order; failures skip the file.
    pub fn process_deferred(&mut self) {
        let queue = self.deferred.queue().to_vec();
        info!(count = queue.len(), "processing deferred files");
        for file in &queue {
            match self.process_deferred_file(file) {
                Ok(DeferredOutcome::Attached(n)) => {
                    debug!(file_id = %file.file_id, entities = n, "deferred file attached");
                    self.summary.deferred_attached += 1;
                }
                Ok(DeferredOutcome::Skipped) => self.summary.deferred_skipped += 1,
                Err(error) => {
                    warn!(file_id = %file.file_id, %error, "skipping deferred file");
                    self.summary.files_skipped += 1;
                }
            }
        }
    }
}
