use std::io::BufRead;
use std::path::Path;

use crate::error::Error;
use crate::model::Record;

fn column(parts: &[&str], idx: usize) -> Option<String> {
    parts
        .get(idx)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_row(line: &str) -> Record {
    let parts: Vec<&str> = line.split('\t').collect();
    Record {
        age: column(&parts, 0),
        population: column(&parts, 1),
        sex: column(&parts, 2),
        disease: column(&parts, 3),
        name: column(&parts, 4),
        synonyms: column(&parts, 5),
        tissue_of_origin: column(&parts, 6),
    }
}

/// Read tab-separated records. The first row is a header and is discarded;
/// reading stops at the first empty line or at end of input. A `limit` of
/// `None` or `Some(0)` reads everything.
pub fn read_records<R: BufRead>(reader: R, limit: Option<usize>) -> Result<Vec<Record>, Error> {
    let limit = limit.filter(|&n| n > 0);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 {
            continue;
        }
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        records.push(parse_row(line));
        if limit.is_some_and(|n| records.len() >= n) {
            break;
        }
    }
    Ok(records)
}

pub fn read_data_file(path: &Path, limit: Option<usize>) -> Result<Vec<Record>, Error> {
    let file = std::fs::File::open(path).map_err(|source| Error::DataFile {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(std::io::BufReader::new(file), limit)?;
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}
