//! # Lead Module
//!
//! The validated lead record and the validator that produces it.
//!
//! ```text
//!     lead/
//!     ├── mod.rs          (module organization)
//!     ├── model.rs        (Lead, closed-set enums, wire mapping)
//!     ├── field_error.rs  (FieldError, RowRef, ValidationErrors)
//!     └── validator.rs    (structural and refinement passes)
//! ```

mod field_error;
mod model;
mod validator;

/// Raw field mapping as submitted by a form or read from a CSV row.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Validation failures
pub use field_error::{FieldError, RowRef, ValidationErrors};

/// Lead record and closed sets
pub use model::{
    Bhk, City, Lead, PropertyType, Purpose, Source, Status, Timeline, UnknownVariant,
};

/// Validator
pub use validator::{
    validate, validate_row, RecordValidator, TagSeparator, FULL_NAME_MAX_CHARS,
    FULL_NAME_MIN_CHARS, MAX_BUDGET, NOTES_MAX_CHARS,
};
