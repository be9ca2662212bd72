//! Field-level validation failures.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Where a [`FieldError`] came from inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowRef {
    /// 1-based data row (the header is not counted).
    Data(usize),
    /// The file as a whole.
    File,
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRef::Data(n) => write!(f, "row {n}"),
            RowRef::File => f.write_str("File"),
        }
    }
}

impl Serialize for RowRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowRef::Data(n) => serializer.serialize_u64(*n as u64),
            RowRef::File => serializer.serialize_str("File"),
        }
    }
}

impl<'de> Deserialize<'de> for RowRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if s == "File" => Ok(RowRef::File),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(RowRef::Data)
                .ok_or_else(|| serde::de::Error::custom("row must be a positive integer")),
            other => Err(serde::de::Error::custom(format!(
                "expected a row number or \"File\", found {other}"
            ))),
        }
    }
}

/// One failed check, tagged with the field it concerns.
///
/// Serializes as `{"row": 3, "field": "phone", "message": "...", "value": "123"}`.
/// `row` is left out for single-record validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<RowRef>,
    pub field: String,
    pub message: String,
    /// The raw input value, `null` when absent.
    pub value: Value,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self {
            row: None,
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    /// Error about the whole file rather than a row.
    pub fn file(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self::new(field, message, value).at_row(RowRef::File)
    }

    pub fn at_row(mut self, row: RowRef) -> Self {
        self.row = Some(row);
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(row) = &self.row {
            write!(f, "{row}: ")?;
        }
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Non-empty, ordered list of [`FieldError`]s for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// `None` for an empty list.
    pub fn new(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First error reported against `field`.
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Tags every error with `row`.
    pub fn with_row(self, row: RowRef) -> Self {
        Self(self.0.into_iter().map(|e| e.at_row(row)).collect())
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
