// load files: one tab-separated table plus a set-membership table per entity type
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::core::graph::{Attributes, DELETE_PLACEHOLDER, EntityGraph, REFERENCE_SUFFIX, Sample};
use crate::core::sample_type;
use crate::core::types::EntityKind;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Set name for a reference attribute: the slot base without its trailing separator.
pub fn set_id(attribute: &str) -> Option<&str> {
    let base = attribute.strip_suffix(REFERENCE_SUFFIX)?;
    Some(base.strip_suffix("__").unwrap_or(base))
}

struct Row<'g> {
    key: &'g str,
    fixed: Vec<String>,
    attributes: &'g Attributes,
}

//columns: entity:{kind}_id, the fixed columns, then every attribute in first-seen order
fn write_entity_table<W: Write, M: Write>(
    kind: EntityKind,
    fixed: &[&str],
    rows: &[Row<'_>],
    mut table: W,
    mut membership: M,
) -> io::Result<()> {
    let names: IndexSet<&str> = rows
        .iter()
        .flat_map(|r| r.attributes.keys().map(String::as_str))
        .collect();

    let kind = kind.as_str();
    let mut header = vec![format!("entity:{kind}_id")];
    header.extend(fixed.iter().map(|c| c.to_string()));
    header.extend(names.iter().map(|n| n.to_string()));
    writeln!(table, "{}", header.join("\t"))?;
    writeln!(membership, "membership:{kind}_set_id\t{kind}_id")?;

    for row in rows {
        let mut line: Vec<&str> = Vec::with_capacity(header.len());
        line.push(row.key);
        line.extend(row.fixed.iter().map(String::as_str));
        for name in &names {
            match row.attributes.get(*name) {
                Some(value) => {
                    line.push(value);
                    if let Some(set) = set_id(name) {
                        writeln!(membership, "{set}\t{}", row.key)?;
                    }
                }
                None => line.push(DELETE_PLACEHOLDER),
            }
        }
        writeln!(table, "{}", line.join("\t"))?;
        writeln!(membership, "ALL\t{}", row.key)?;
    }
    table.flush()?;
    membership.flush()
}

fn type_letter(code: Option<&str>) -> String {
    sample_type::letter_code(code).unwrap_or(DELETE_PLACEHOLDER).to_string()
}

pub fn write_participants<W: Write, M: Write>(graph: &EntityGraph, table: W, membership: M) -> io::Result<()> {
    let rows: Vec<Row<'_>> = graph
        .participants
        .iter()
        .map(|(id, p)| Row {
            key: id,
            fixed: vec![p.submitter_id.clone(), p.project_id.clone()],
            attributes: &p.attributes,
        })
        .collect();
    write_entity_table(EntityKind::Participant, &["submitter_id", "project_id"], &rows, table, membership)
}

pub fn write_samples<W: Write, M: Write>(graph: &EntityGraph, table: W, membership: M) -> io::Result<()> {
    let rows: Vec<Row<'_>> = graph
        .samples
        .iter()
        .map(|(id, s)| Row {
            key: id,
            fixed: vec![
                s.participant.clone(),
                s.submitter_id.clone(),
                type_letter(s.sample_type_id.as_deref()),
            ],
            attributes: &s.attributes,
        })
        .collect();
    write_entity_table(
        EntityKind::Sample,
        &["participant_id", "submitter_id", "sample_type"],
        &rows,
        table,
        membership,
    )
}

pub fn write_pairs<W: Write, M: Write>(graph: &EntityGraph, table: W, membership: M) -> io::Result<()> {
    let rows: Vec<Row<'_>> = graph
        .pairs
        .iter()
        .map(|(id, pair)| {
            let tumor = graph.samples.get(&pair.tumor);
            let normal = graph.samples.get(&pair.normal);
            let submitter = |s: Option<&Sample>| {
                s.map_or(DELETE_PLACEHOLDER.to_string(), |s| s.submitter_id.clone())
            };
            //no code means an empty cell here, unlike the sample table
            let letter = |s: Option<&Sample>| {
                sample_type::letter_code(s.and_then(|s| s.sample_type_id.as_deref()))
                    .unwrap_or_default()
                    .to_string()
            };
            Row {
                key: id,
                fixed: vec![
                    tumor.map_or(DELETE_PLACEHOLDER.to_string(), |s| s.participant.clone()),
                    pair.tumor.clone(),
                    pair.normal.clone(),
                    submitter(tumor),
                    submitter(normal),
                    letter(tumor),
                    letter(normal),
                ],
                attributes: &pair.attributes,
            }
        })
        .collect();
    write_entity_table(
        EntityKind::Pair,
        &[
            "participant_id",
            "case_sample_id",
            "control_sample_id",
            "tumor_submitter_id",
            "normal_submitter_id",
            "tumor_type",
            "normal_type",
        ],
        &rows,
        table,
        membership,
    )
}

/// Workspace attributes; the column-defaults attribute must stay the last column.
pub fn write_workspace_attributes<W: Write>(mut out: W) -> io::Result<()> {
    let defaults = json!({
        "participant": {"shown": ["submitter_id", "project_id", "participant_id"]},
        "sample": {"shown": ["submitter_id", "sample_id", "participant", "sample_type"]},
        "pair": {"shown": ["tumor_submitter_id", "normal_submitter_id", "pair_id"]},
    });
    writeln!(out, "workspace:legacy_flag\tworkspace-column-defaults")?;
    writeln!(out, "false\t{defaults}")?;
    out.flush()
}

fn create(path: &Path) -> Result<BufWriter<File>, TableError> {
    File::create(path).map(BufWriter::new).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every load file for `graph` into `dir`, named after `basename`.
///
/// Pair files are only written when the run found at least one pair.
pub fn write_load_files(graph: &EntityGraph, dir: &Path, basename: &str) -> Result<Vec<PathBuf>, TableError> {
    let path = |suffix: &str| dir.join(format!("{basename}_{suffix}.txt"));
    let mut written = Vec::new();

    let mut kinds = vec![EntityKind::Participant, EntityKind::Sample];
    if !graph.pairs.is_empty() {
        kinds.push(EntityKind::Pair);
    }

    for kind in kinds {
        let table_path = path(&format!("{}s", kind.as_str()));
        let membership_path = path(&format!("{}_sets_membership", kind.as_str()));
        let table = create(&table_path)?;
        let membership = create(&membership_path)?;
        let result = match kind {
            EntityKind::Participant => write_participants(graph, table, membership),
            EntityKind::Sample => write_samples(graph, table, membership),
            EntityKind::Pair => write_pairs(graph, table, membership),
        };
        result.map_err(|source| TableError::Io {
            path: table_path.clone(),
            source,
        })?;
        written.push(table_path);
        written.push(membership_path);
    }

    let attributes_path = path("workspace_attributes");
    write_workspace_attributes(create(&attributes_path)?).map_err(|source| TableError::Io {
        path: attributes_path.clone(),
        source,
    })?;
    written.push(attributes_path);

    for p in &written {
        info!(path = %p.display(), "wrote load file");
    }
    Ok(written)
}
