//! # Batch Ingestion
//!
//! Bulk import of leads from a CSV payload, with partial success: good rows
//! are accepted, bad rows are reported, and neither blocks the other.
//!
//! ```text
//!     CSV bytes
//!        │
//!        ▼
//!     ┌────────┐  no header / bad UTF-8 / malformed  ─► [File] parse error
//!     │ parse  │
//!     └───┬────┘
//!         ▼
//!     ┌────────┐  rows > max_rows                    ─► [File] size error
//!     │ gate   │
//!     └───┬────┘
//!         ▼
//!     ┌────────┐  per row, in order
//!     │validate│ ─► accepted: Vec<Lead>   rejected: Vec<FieldError{row}>
//!     └────────┘
//! ```

mod export;
mod parse;

pub use export::{to_csv, to_csv_with, write_csv};

use crate::error::{ConfigError, IngestError};
use crate::lead::{FieldError, Lead, RawRecord, RecordValidator, RowRef, TagSeparator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::time::Instant;
use tracing::{info, warn};

/// Default ceiling on data rows per import.
pub const DEFAULT_MAX_ROWS: usize = 200;

/// Batch import settings.
///
/// ```rust
/// use leadgate::{IngestConfig, TagSeparator};
///
/// let config: IngestConfig = serde_json::from_str(r#"{"tag_separator": ";"}"#).unwrap();
/// assert_eq!(config.max_rows, 200);
/// assert_eq!(config.tag_separator, TagSeparator::SEMICOLON);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Files with more data rows than this are rejected whole.
    pub max_rows: usize,

    /// Splits the `tags` column.
    pub tag_separator: TagSeparator,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            tag_separator: TagSeparator::default(),
        }
    }
}

impl IngestConfig {
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_tag_separator(mut self, tag_separator: TagSeparator) -> Self {
        self.tag_separator = tag_separator;
        self
    }

    /// # Errors
    ///
    /// [`ConfigError::ZeroMaxRows`] when `max_rows` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == 0 {
            return Err(ConfigError::ZeroMaxRows);
        }
        Ok(())
    }
}

/// Outcome of one batch import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Valid leads, in input order.
    pub accepted: Vec<Lead>,

    /// Every failure, in input order. Row errors carry their 1-based row;
    /// whole-file errors carry [`RowRef::File`].
    pub rejected: Vec<FieldError>,
}

impl IngestReport {
    fn file_error(error: FieldError) -> Self {
        Self {
            accepted: Vec::new(),
            rejected: vec![error],
        }
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    /// Distinct data rows with at least one error.
    pub fn rejected_row_count(&self) -> usize {
        self.rejected
            .iter()
            .filter_map(|e| match e.row {
                Some(RowRef::Data(n)) => Some(n),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// The whole-file error, if the file was refused before row validation.
    pub fn file_rejection(&self) -> Option<&FieldError> {
        self.rejected.iter().find(|e| e.row == Some(RowRef::File))
    }

    /// No errors of any kind.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// One-line report.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "accepted={} rejected_rows={} errors={}",
            self.accepted_count(),
            self.rejected_row_count(),
            self.rejected.len()
        );
        if let Some(file) = self.file_rejection() {
            line.push_str(&format!(" file_error={:?}", file.message));
        }
        line
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// CSV import pipeline.
///
/// ```rust
/// use leadgate::BatchIngestionPipeline;
///
/// let pipeline = BatchIngestionPipeline::default();
/// let csv = "fullName,phone,city,propertyType,purpose,timeline,source\n\
///            Asha Rao,9876543210,Mohali,Plot,Buy,0-3m,Website\n\
///            X,123,Delhi,Plot,Buy,0-3m,Website\n";
///
/// let report = pipeline.ingest(csv);
/// assert_eq!(report.accepted_count(), 1);
/// assert_eq!(report.rejected_row_count(), 1);
/// assert_eq!(report.rejected.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchIngestionPipeline {
    config: IngestConfig,
    validator: RecordValidator,
}

impl BatchIngestionPipeline {
    /// # Errors
    ///
    /// Returns the [`ConfigError`] from [`IngestConfig::validate`].
    pub fn new(config: IngestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            validator: RecordValidator::new(config.tag_separator),
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Imports CSV text.
    pub fn ingest(&self, csv_text: &str) -> IngestReport {
        self.ingest_bytes(csv_text.as_bytes())
    }

    /// Reads the whole payload from `reader`, then imports it.
    ///
    /// # Errors
    ///
    /// [`IngestError::Io`] if reading fails. Malformed content is reported
    /// inside the returned [`IngestReport`] instead.
    pub fn ingest_reader<R: Read>(&self, mut reader: R) -> Result<IngestReport, IngestError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|err| {
            warn!(error = %err, "batch_read_failure");
            IngestError::Io(err)
        })?;
        Ok(self.ingest_bytes(&bytes))
    }

    /// Applies the row gate and validation to rows parsed elsewhere.
    pub fn ingest_rows(&self, rows: &[RawRecord]) -> IngestReport {
        if rows.len() > self.config.max_rows {
            warn!(
                rows = rows.len(),
                max_rows = self.config.max_rows,
                "batch_rejected_size"
            );
            return IngestReport::file_error(FieldError::file(
                "size",
                format!("Maximum {} rows allowed", self.config.max_rows),
                json!(rows.len()),
            ));
        }

        let mut report = IngestReport::default();
        for (index, row) in rows.iter().enumerate() {
            match self.validator.validate_row(row) {
                Ok(lead) => report.accepted.push(lead),
                Err(errors) => report
                    .rejected
                    .extend(errors.with_row(RowRef::Data(index + 1))),
            }
        }
        report
    }

    fn ingest_bytes(&self, bytes: &[u8]) -> IngestReport {
        let start = Instant::now();
        let rows = match parse::parse_rows(bytes) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, bytes = bytes.len(), "batch_parse_failure");
                return IngestReport::file_error(FieldError::file(
                    "parse",
                    "Failed to parse CSV file",
                    json!(err.to_string()),
                ));
            }
        };

        let report = self.ingest_rows(&rows);
        if report.file_rejection().is_none() {
            info!(
                rows = rows.len(),
                accepted = report.accepted_count(),
                rejected_rows = report.rejected_row_count(),
                errors = report.rejected.len(),
                elapsed_micros = start.elapsed().as_micros() as u64,
                "batch_ingested"
            );
        }
        report
    }
}

/// Imports CSV text with [`IngestConfig::default`].
pub fn ingest(csv_text: &str) -> IngestReport {
    BatchIngestionPipeline::default().ingest(csv_text)
}

/// Imports a CSV payload from `reader` with [`IngestConfig::default`].
///
/// # Errors
///
/// [`IngestError::Io`] if reading fails.
pub fn ingest_reader<R: Read>(reader: R) -> Result<IngestReport, IngestError> {
    BatchIngestionPipeline::default().ingest_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{Bhk, Status};
    use serde_json::Value;
    use std::io;

    const HEADER: &str = "fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status";
    const GOOD_ROW: &str = "John Doe,john@example.com,9876543210,Chandigarh,Apartment,2,Buy,5000000,7000000,0-3m,Website,\"Looking for 2BHK\",\"urgent,family\",New";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn test_good_row() {
        let report = ingest(&csv_with(&[GOOD_ROW]));
        assert!(report.is_clean());
        let lead = &report.accepted[0];
        assert_eq!(lead.bhk, Some(Bhk::Two));
        assert_eq!(lead.tags, vec!["urgent", "family"]);
        assert_eq!(lead.status, Status::New);
    }

    #[test]
    fn test_partial_success_keeps_order_and_rows() {
        let bad_phone = "Jane,,123,Mohali,Plot,,Rent,,,3-6m,Call,,,";
        let bad_bhk = "Ravi,,9876543210,Mohali,Villa,,Buy,,,>6m,Referral,,,";
        let report = ingest(&csv_with(&[GOOD_ROW, bad_phone, GOOD_ROW, bad_bhk]));

        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.rejected_row_count(), 2);
        assert_eq!(report.rejected[0].row, Some(RowRef::Data(2)));
        assert_eq!(report.rejected[0].field, "phone");
        assert_eq!(report.rejected[0].value, json!("123"));
        assert_eq!(report.rejected[1].row, Some(RowRef::Data(4)));
        assert_eq!(report.rejected[1].field, "bhk");
        assert_eq!(report.summary(), "accepted=2 rejected_rows=2 errors=2");
    }

    #[test]
    fn test_multiple_errors_per_row_flatten() {
        let report = ingest(&csv_with(&["J,bad,1,Delhi,Plot,,Buy,,,0-3m,Website,,,"]));
        let fields: Vec<_> = report.rejected.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["fullName", "email", "phone", "city"]);
        assert_eq!(report.rejected_row_count(), 1);
    }

    #[test]
    fn test_row_ceiling() {
        let pipeline = BatchIngestionPipeline::new(IngestConfig::default().with_max_rows(2)).unwrap();
        let report = pipeline.ingest(&csv_with(&[GOOD_ROW, GOOD_ROW, GOOD_ROW]));
        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 1);
        let error = &report.rejected[0];
        assert_eq!(error.row, Some(RowRef::File));
        assert_eq!(error.field, "size");
        assert_eq!(error.message, "Maximum 2 rows allowed");
        assert_eq!(error.value, json!(3));
        assert!(report.summary().contains("file_error"));

        assert_eq!(pipeline.ingest(&csv_with(&[GOOD_ROW, GOOD_ROW])).accepted_count(), 2);
    }

    #[test]
    fn test_parse_failure() {
        let report = ingest("");
        assert_eq!(report.rejected.len(), 1);
        let error = &report.rejected[0];
        assert_eq!(error.row, Some(RowRef::File));
        assert_eq!(error.field, "parse");
        assert_eq!(error.message, "Failed to parse CSV file");
        assert_eq!(error.value, json!("missing header row"));
    }

    #[test]
    fn test_invalid_utf8_is_parse_failure() {
        let mut bytes = csv_with(&[]).into_bytes();
        bytes.extend_from_slice(b"\n\xc3\x28,x\n");
        let report = ingest_reader(&bytes[..]).unwrap();
        assert_eq!(report.file_rejection().unwrap().field, "parse");
        assert!(matches!(report.rejected[0].value, Value::String(_)));
    }

    #[test]
    fn test_header_only_is_clean() {
        let report = ingest(HEADER);
        assert!(report.is_clean());
        assert_eq!(report.accepted_count(), 0);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "upload interrupted"))
        }
    }

    #[test]
    fn test_io_failure_propagates() {
        let err = ingest_reader(FailingReader).unwrap_err();
        assert!(matches!(err, IngestError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_config() {
        assert_eq!(IngestConfig::default().max_rows, DEFAULT_MAX_ROWS);
        assert_eq!(
            BatchIngestionPipeline::new(IngestConfig::default().with_max_rows(0)).err(),
            Some(ConfigError::ZeroMaxRows)
        );
        assert!(serde_json::from_str::<IngestConfig>(r#"{"tag_separator": "\n"}"#).is_err());
    }

    #[test]
    fn test_semicolon_pipeline() {
        let config = IngestConfig::default().with_tag_separator(TagSeparator::SEMICOLON);
        let pipeline = BatchIngestionPipeline::new(config).unwrap();
        let row = "John Doe,,9876543210,Mohali,Plot,,Buy,,,Exploring,Website,,\"north, quiet;corner\",";
        let report = pipeline.ingest(&csv_with(&[row]));
        assert_eq!(report.accepted[0].tags, vec!["north, quiet", "corner"]);
    }
}
