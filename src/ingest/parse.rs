//! CSV payload to raw row records.

use crate::lead::RawRecord;
use serde_json::Value;
use thiserror::Error;

/// Why a payload could not be read as CSV at all.
#[derive(Debug, Error)]
pub(crate) enum ParseFailure {
    #[error("missing header row")]
    MissingHeader,

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Reads `bytes` as a headed CSV file.
///
/// Header cells are trimmed. Short rows leave their trailing fields absent
/// and cells past the last header are dropped. Only completely empty lines
/// are skipped: a line of separators or spaces is still a data row.
pub(crate) fn parse_rows(bytes: &[u8]) -> Result<Vec<RawRecord>, ParseFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ParseFailure::MissingHeader);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;

        let mut row = RawRecord::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            row.insert(header.clone(), Value::String(cell.to_owned()));
        }
        rows.push(row);
    }
    Ok(rows)
}
