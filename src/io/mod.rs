// files read and written around a run
pub mod manifest;
pub mod resolver;
pub mod snapshot;
pub mod tables;

use std::io::BufRead;

use manifest::ManifestError;

/// Pull named columns out of a tab-separated file with a header row.
///
/// Each entry of `wanted` lists the accepted header names for one column.
/// Blank lines are skipped; line numbers in errors count the header as 1.
pub(crate) fn read_columns<R: BufRead, const N: usize>(
    reader: R,
    wanted: [&[&str]; N],
) -> Result<Vec<[String; N]>, ManifestError> {
    let mut lines = reader.lines();
    let header = lines.next().ok_or(ManifestError::Empty)??;
    let header: Vec<&str> = header.trim_end_matches('\r').split('\t').map(str::trim).collect();

    let mut index = [0usize; N];
    for (slot, names) in index.iter_mut().zip(wanted) {
        *slot = header
            .iter()
            .position(|h| names.contains(h))
            .ok_or_else(|| ManifestError::MissingColumn(names.join("|")))?;
    }
    let width = index.iter().max().map_or(0, |m| m + 1);

    let mut rows = Vec::new();
    for (n, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < width {
            return Err(ManifestError::ShortRow {
                line: n + 2,
                expected: width,
                found: fields.len(),
            });
        }
        rows.push(std::array::from_fn(|i| fields[index[i]].trim().to_string()));
    }
    Ok(rows)
}
