// manifest: ordered (file id, filename) records from the portal's download manifest
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::core::types::FileRef;

/// Errors reading a tab-separated input (manifest or UUID→URL table).
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("file has no header row")]
    Empty,
    #[error("header has no {0} column")]
    MissingColumn(String),
    #[error("line {line}: expected at least {expected} columns, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

const ID_COLUMN: &[&str] = &["id"];
const FILENAME_COLUMN: &[&str] = &["filename"];

pub fn read_manifest<R: BufRead>(reader: R) -> Result<Vec<FileRef>, ManifestError> {
    let rows = super::read_columns(reader, [ID_COLUMN, FILENAME_COLUMN])?;
    Ok(rows
        .into_iter()
        .map(|[file_id, filename]| FileRef::new(file_id, filename))
        .collect())
}

pub fn load_manifest(path: &Path) -> Result<Vec<FileRef>, ManifestError> {
    read_manifest(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_ids_and_filenames_in_order() {
        let text = "id\tfilename\tmd5\tsize\tstate\n\
                    f2\tb.vcf\t00\t10\treleased\n\
                    f1\ta.tsv\t11\t20\treleased\n";
        let files = read_manifest(text.as_bytes()).unwrap();
        assert_eq!(files, vec![FileRef::new("f2", "b.vcf"), FileRef::new("f1", "a.tsv")]);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdc_manifest.txt");
        std::fs::write(&path, "filename\tid\nx.svs\tX\n").unwrap();
        assert_eq!(load_manifest(&path).unwrap(), vec![FileRef::new("X", "x.svs")]);
        assert!(matches!(
            load_manifest(&dir.path().join("nope.txt")),
            Err(ManifestError::Io(_))
        ));
    }
}
