// registry snapshot in TOON, for inspecting a run without the load files
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::core::graph::EntityGraph;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("encoding snapshot: {0}")]
    Encode(String),
    #[error("writing snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn render_snapshot(graph: &EntityGraph) -> Result<String, SnapshotError> {
    toon_format::encode_default(graph).map_err(|e| SnapshotError::Encode(e.to_string()))
}

pub fn write_snapshot(graph: &EntityGraph, path: &Path) -> Result<(), SnapshotError> {
    let text = render_snapshot(graph)?;
    fs::write(path, text).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote registry snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::CaseInfo;

    #[test]
    fn snapshot_names_every_participant() {
        let mut g = EntityGraph::new();
        g.ensure_participant(&CaseInfo {
            case_id: "case-0001".to_string(),
            submitter_id: "TCGA-BL-A0C8".to_string(),
            project_id: "TCGA-BLCA".to_string(),
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toon");
        write_snapshot(&g, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("case-0001"));
        assert!(text.contains("TCGA-BL-A0C8"));
    }
}
