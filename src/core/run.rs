// run context: the registry, the deferred side table and the collaborators of one run
use thiserror::Error;
use tracing::{info, warn};

use crate::core::deferred::DeferredCases;
use crate::core::graph::{EntityGraph, GraphError};
use crate::core::mapping::{AssignError, Assignment};
use crate::core::propagate::Placement;
use crate::core::types::FileRef;
use crate::io::resolver::UrlResolver;
use crate::metadata::{FetchError, MetadataSource};

/// Per-file failures. Each one skips the file it was raised for.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("file {file_id} is missing required field {field}")]
    MissingField { file_id: String, field: &'static str },
    #[error("file {file_id} has no associated case")]
    NoCases { file_id: String },
    #[error("file {file_id} is associated with {found} samples of a single case")]
    TooManySamples { file_id: String, found: usize },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Assign(#[from] AssignError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_placed: usize,
    pub files_deferred: usize,
    pub files_skipped: usize,
    pub deferred_attached: usize,
    pub deferred_skipped: usize,
    pub collisions_replaced: usize,
    pub collisions_kept: usize,
    pub collisions_unresolved: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Assignment) {
        match outcome {
            Assignment::Inserted | Assignment::Refreshed => {}
            Assignment::Replaced { .. } => self.collisions_replaced += 1,
            Assignment::Kept { .. } => self.collisions_kept += 1,
            Assignment::Unresolved { .. } => self.collisions_unresolved += 1,
        }
    }
}

/// Everything a run owns. The graph and the deferred table are never shared
/// outside the run; the resolver borrows the deferred table per collision.
pub struct LoadRun<'s> {
    pub(crate) source: &'s dyn MetadataSource,
    pub(crate) urls: UrlResolver,
    pub(crate) all_cases: bool,
    pub(crate) graph: EntityGraph,
    pub(crate) deferred: DeferredCases,
    pub(crate) summary: RunSummary,
}

impl<'s> LoadRun<'s> {
    pub fn new(source: &'s dyn MetadataSource, urls: UrlResolver, all_cases: bool) -> Self {
        Self {
            source,
            urls,
            all_cases,
            graph: EntityGraph::new(),
            deferred: DeferredCases::default(),
            summary: RunSummary::default(),
        }
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn deferred(&self) -> &DeferredCases {
        &self.deferred
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Primary pass over the manifest in order, then the deferred pass.
    ///
    /// A failing file is logged and skipped; the run itself never fails.
    pub fn run(&mut self, manifest: &[FileRef]) {
        let total = manifest.len();
        for (i, file) in manifest.iter().enumerate() {
            info!(n = i + 1, total, file_id = %file.file_id, filename = %file.filename, "processing file");
            match self.ingest_file(file) {
                Ok(Placement::Deferred { cases }) => {
                    info!(file_id = %file.file_id, cases, "file spans several cases, deferred");
                    self.summary.files_deferred += 1;
                }
                Ok(_) => self.summary.files_placed += 1,
                Err(error) => {
                    warn!(file_id = %file.file_id, %error, "skipping file");
                    self.summary.files_skipped += 1;
                }
            }
        }

        self.process_deferred();

        let s = &self.summary;
        info!(
            placed = s.files_placed,
            deferred = s.files_deferred,
            skipped = s.files_skipped,
            deferred_attached = s.deferred_attached,
            deferred_skipped = s.deferred_skipped,
            replaced = s.collisions_replaced,
            kept = s.collisions_kept,
            unresolved = s.collisions_unresolved,
            participants = self.graph.participants.len(),
            samples = self.graph.samples.len(),
            pairs = self.graph.pairs.len(),
            "run complete"
        );
    }

    pub fn into_parts(self) -> (EntityGraph, RunSummary) {
        (self.graph, self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collision::ResolveError;

    #[test]
    fn summary_counts_collision_outcomes() {
        let mut s = RunSummary::default();
        let f = FileRef::new("a", "a.tsv");
        s.record(&Assignment::Inserted);
        s.record(&Assignment::Refreshed);
        s.record(&Assignment::Replaced { previous: f.clone() });
        s.record(&Assignment::Kept { existing: f.clone() });
        s.record(&Assignment::Kept { existing: f.clone() });
        s.record(&Assignment::Unresolved {
            existing: f,
            error: ResolveError::NoCase { file_id: "b".to_string() },
        });

        assert_eq!(s.collisions_replaced, 1);
        assert_eq!(s.collisions_kept, 2);
        assert_eq!(s.collisions_unresolved, 1);
        assert_eq!(s.files_placed, 0);
    }
}
