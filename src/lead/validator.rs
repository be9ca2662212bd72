//! # Record Validator
//!
//! Turns a raw field mapping into a [`Lead`] or a list of [`FieldError`]s.
//!
//! ```text
//!     RawRecord
//!        │
//!        ▼
//!     ┌────────────┐   every field checked, every failure kept
//!     │ structural │ ─────────────────────────────────────► Err(errors)
//!     └─────┬──────┘
//!           ▼ (no structural errors)
//!     ┌────────────┐   bhk for Apartment/Villa, budgetMax ≥ budgetMin
//!     │ refinement │ ─────────────────────────────────────► Err(errors)
//!     └─────┬──────┘
//!           ▼
//!        Ok(Lead)
//! ```
//!
//! Form mode takes JSON values as submitted (budgets may be numbers, tags may
//! be an array). Row mode takes CSV cells, so every value must be a string.

use super::field_error::{FieldError, ValidationErrors};
use super::model::{Bhk, City, Lead, PropertyType, Purpose, Source, Status, Timeline};
use super::RawRecord;
use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// Maximum `fullName` length in characters.
pub const FULL_NAME_MAX_CHARS: usize = 80;

/// Minimum `fullName` length in characters.
pub const FULL_NAME_MIN_CHARS: usize = 2;

/// Maximum `notes` length in characters.
pub const NOTES_MAX_CHARS: usize = 1000;

/// Largest budget that survives a round trip through an IEEE double.
pub const MAX_BUDGET: u64 = (1 << 53) - 1;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@(?:[A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .unwrap_or_else(|e| unreachable!("email pattern is a literal: {e}"))
});

/// Character that splits a tags cell into individual tags.
///
/// ```rust
/// use leadgate::TagSeparator;
///
/// assert_eq!(TagSeparator::default().as_char(), ',');
/// assert!(TagSeparator::new(';').is_ok());
/// assert!(TagSeparator::new('"').is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct TagSeparator(char);

impl TagSeparator {
    /// Comma, the separator existing import files use.
    pub const COMMA: TagSeparator = TagSeparator(',');

    /// Semicolon, which lets tags contain commas.
    pub const SEMICOLON: TagSeparator = TagSeparator(';');

    /// # Errors
    ///
    /// Quotes, line breaks and whitespace are rejected: the first two belong
    /// to CSV quoting and the last is trimmed away from tags.
    pub fn new(separator: char) -> Result<Self, ConfigError> {
        if separator == '"' || separator.is_whitespace() || separator.is_control() {
            return Err(ConfigError::InvalidTagSeparator(separator));
        }
        Ok(Self(separator))
    }

    /// The separator character.
    #[inline]
    pub fn as_char(&self) -> char {
        self.0
    }

    /// Splits `cell` into trimmed, non-empty tags, keeping order.
    pub fn split(&self, cell: &str) -> Vec<String> {
        cell.split(self.0)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Inverse of [`split`](Self::split).
    pub fn join(&self, tags: &[String]) -> String {
        let mut sep = [0u8; 4];
        tags.join(&*self.0.encode_utf8(&mut sep))
    }
}

impl Default for TagSeparator {
    fn default() -> Self {
        Self::COMMA
    }
}

impl TryFrom<char> for TagSeparator {
    type Error = ConfigError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TagSeparator> for char {
    fn from(value: TagSeparator) -> Self {
        value.0
    }
}

impl fmt::Display for TagSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Form,
    Row,
}

/// Field name plus the label used in "is required" messages.
#[derive(Clone, Copy)]
struct Field {
    name: &'static str,
    label: &'static str,
}

const FULL_NAME: Field = Field { name: "fullName", label: "Full name" };
const EMAIL: Field = Field { name: "email", label: "Email" };
const PHONE: Field = Field { name: "phone", label: "Phone" };
const CITY: Field = Field { name: "city", label: "City" };
const PROPERTY_TYPE: Field = Field { name: "propertyType", label: "Property type" };
const BHK: Field = Field { name: "bhk", label: "BHK" };
const PURPOSE: Field = Field { name: "purpose", label: "Purpose" };
const BUDGET_MIN: Field = Field { name: "budgetMin", label: "Minimum budget" };
const BUDGET_MAX: Field = Field { name: "budgetMax", label: "Maximum budget" };
const TIMELINE: Field = Field { name: "timeline", label: "Timeline" };
const SOURCE: Field = Field { name: "source", label: "Source" };
const NOTES: Field = Field { name: "notes", label: "Notes" };
const TAGS: Field = Field { name: "tags", label: "Tags" };
const STATUS: Field = Field { name: "status", label: "Status" };

/// A whole-record rule checked once every field is structurally valid.
struct Refinement {
    field: &'static str,
    holds: fn(&Lead) -> bool,
    message: &'static str,
}

const REFINEMENTS: &[Refinement] = &[
    Refinement {
        field: "bhk",
        holds: |lead| !lead.property_type.requires_bhk() || lead.bhk.is_some(),
        message: "BHK is required for Apartment and Villa properties",
    },
    Refinement {
        field: "budgetMax",
        holds: |lead| match (lead.budget_min, lead.budget_max) {
            (Some(min), Some(max)) => max >= min,
            _ => true,
        },
        message: "Maximum budget must be greater than or equal to minimum budget",
    },
];

/// Validator for lead records.
///
/// Stateless apart from the tag separator; share one freely across threads.
///
/// ```rust
/// use leadgate::RecordValidator;
/// use serde_json::json;
///
/// let validator = RecordValidator::default();
/// let raw = json!({
///     "fullName": "John Doe", "phone": "9876543210", "city": "Chandigarh",
///     "propertyType": "Apartment", "purpose": "Buy", "timeline": "0-3m",
///     "source": "Website"
/// });
///
/// let errors = validator.validate(raw.as_object().unwrap()).unwrap_err();
/// assert_eq!(errors.for_field("bhk").unwrap().message,
///            "BHK is required for Apartment and Villa properties");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordValidator {
    tag_separator: TagSeparator,
}

impl RecordValidator {
    /// Creates a validator that splits row-mode tags on `tag_separator`.
    pub fn new(tag_separator: TagSeparator) -> Self {
        Self { tag_separator }
    }

    /// Separator used for row-mode tag cells.
    pub fn tag_separator(&self) -> TagSeparator {
        self.tag_separator
    }

    /// Validates a form submission.
    pub fn validate(&self, raw: &RawRecord) -> Result<Lead, ValidationErrors> {
        self.run(raw, Mode::Form)
    }

    /// Validates one CSV row, where every cell is a string.
    pub fn validate_row(&self, raw: &RawRecord) -> Result<Lead, ValidationErrors> {
        self.run(raw, Mode::Row)
    }

    fn run(&self, raw: &RawRecord, mode: Mode) -> Result<Lead, ValidationErrors> {
        let lead = self.structural(raw, mode)?;
        refine(raw, &lead)?;
        Ok(lead)
    }

    fn structural(&self, raw: &RawRecord, mode: Mode) -> Result<Lead, ValidationErrors> {
        let input = Input { raw, mode };
        let mut c = Collector::default();

        let full_name = c.take(input.full_name());
        let email = c.take(input.email());
        let phone = c.take(input.phone());
        let city = c.take(input.required_enum(CITY, City::parse, "Please select a valid city"));
        let property_type = c.take(input.required_enum(
            PROPERTY_TYPE,
            PropertyType::parse,
            "Please select a valid property type",
        ));
        let bhk = c.take(input.optional_enum(BHK, Bhk::parse, "Please select a valid BHK option"));
        let purpose = c.take(input.required_enum(
            PURPOSE,
            Purpose::parse,
            "Please select a valid purpose",
        ));
        let budget_min = c.take(input.budget(BUDGET_MIN));
        let budget_max = c.take(input.budget(BUDGET_MAX));
        let timeline = c.take(input.required_enum(
            TIMELINE,
            Timeline::parse,
            "Please select a valid timeline",
        ));
        let source =
            c.take(input.required_enum(SOURCE, Source::parse, "Please select a valid source"));
        let notes = c.take(input.notes());
        let tags = c.take(input.tags(self.tag_separator));
        let status =
            c.take(input.optional_enum(STATUS, Status::parse, "Please select a valid status"));

        let (
            Some(full_name),
            Some(email),
            Some(phone),
            Some(city),
            Some(property_type),
            Some(bhk),
            Some(purpose),
            Some(budget_min),
            Some(budget_max),
            Some(timeline),
            Some(source),
            Some(notes),
            Some(tags),
            Some(status),
        ) = (
            full_name,
            email,
            phone,
            city,
            property_type,
            bhk,
            purpose,
            budget_min,
            budget_max,
            timeline,
            source,
            notes,
            tags,
            status,
        )
        else {
            return Err(c.finish());
        };

        Ok(Lead {
            full_name,
            email,
            phone,
            city,
            property_type,
            bhk,
            purpose,
            budget_min,
            budget_max,
            timeline,
            source,
            notes,
            tags,
            status: status.unwrap_or_default(),
        })
    }
}

/// Validates a form submission with the default comma tag separator.
pub fn validate(raw: &RawRecord) -> Result<Lead, ValidationErrors> {
    RecordValidator::default().validate(raw)
}

/// Validates one CSV row with the default comma tag separator.
pub fn validate_row(raw: &RawRecord) -> Result<Lead, ValidationErrors> {
    RecordValidator::default().validate_row(raw)
}

fn refine(raw: &RawRecord, lead: &Lead) -> Result<(), ValidationErrors> {
    let errors = REFINEMENTS
        .iter()
        .filter(|rule| !(rule.holds)(lead))
        .map(|rule| FieldError::new(rule.field, rule.message, raw_value(raw, rule.field)))
        .collect();
    match ValidationErrors::new(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

fn raw_value(raw: &RawRecord, field: &str) -> Value {
    raw.get(field).cloned().unwrap_or(Value::Null)
}

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn take<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    fn finish(self) -> ValidationErrors {
        // A field came back `None`, so at least one error was pushed.
        ValidationErrors::new(self.errors).unwrap_or_else(|| {
            unreachable!("structural pass failed without recording an error")
        })
    }
}

/// What a raw value looks like after absence rules are applied.
enum Cell<'a> {
    Absent,
    Text(&'a str),
    Other(&'a Value),
}

struct Input<'a> {
    raw: &'a RawRecord,
    mode: Mode,
}

impl<'a> Input<'a> {
    fn cell(&self, field: Field) -> Cell<'a> {
        match self.raw.get(field.name) {
            None | Some(Value::Null) => Cell::Absent,
            Some(Value::String(s)) if s.is_empty() => Cell::Absent,
            Some(Value::String(s)) => Cell::Text(s),
            Some(other) => Cell::Other(other),
        }
    }

    fn error(&self, field: Field, message: impl Into<String>) -> FieldError {
        FieldError::new(field.name, message, raw_value(self.raw, field.name))
    }

    fn required(&self, field: Field) -> FieldError {
        self.error(field, format!("{} is required", field.label))
    }

    fn not_text(&self, field: Field) -> FieldError {
        self.error(field, format!("{} must be text", field.label))
    }

    fn full_name(&self) -> Result<String, FieldError> {
        match self.cell(FULL_NAME) {
            Cell::Absent => Err(self.required(FULL_NAME)),
            Cell::Other(_) => Err(self.not_text(FULL_NAME)),
            Cell::Text(s) => {
                let len = s.chars().count();
                if len < FULL_NAME_MIN_CHARS {
                    Err(self.error(FULL_NAME, "Full name must be at least 2 characters"))
                } else if len > FULL_NAME_MAX_CHARS {
                    Err(self.error(FULL_NAME, "Full name must not exceed 80 characters"))
                } else {
                    Ok(s.to_owned())
                }
            }
        }
    }

    fn email(&self) -> Result<Option<String>, FieldError> {
        match self.cell(EMAIL) {
            Cell::Absent => Ok(None),
            Cell::Text(s) if is_valid_email(s) => Ok(Some(s.to_owned())),
            _ => Err(self.error(EMAIL, "Invalid email format")),
        }
    }

    fn phone(&self) -> Result<String, FieldError> {
        match self.cell(PHONE) {
            Cell::Absent => Err(self.required(PHONE)),
            Cell::Text(s) if is_valid_phone(s) => Ok(s.to_owned()),
            _ => Err(self.error(PHONE, "Phone must be 10-15 digits")),
        }
    }

    fn required_enum<T>(
        &self,
        field: Field,
        parse: fn(&str) -> Option<T>,
        invalid: &'static str,
    ) -> Result<T, FieldError> {
        match self.cell(field) {
            Cell::Absent => Err(self.required(field)),
            Cell::Text(s) => parse(s).ok_or_else(|| self.error(field, invalid)),
            Cell::Other(_) => Err(self.error(field, invalid)),
        }
    }

    fn optional_enum<T>(
        &self,
        field: Field,
        parse: fn(&str) -> Option<T>,
        invalid: &'static str,
    ) -> Result<Option<T>, FieldError> {
        match self.cell(field) {
            Cell::Absent => Ok(None),
            Cell::Text(s) => parse(s).map(Some).ok_or_else(|| self.error(field, invalid)),
            Cell::Other(_) => Err(self.error(field, invalid)),
        }
    }

    fn budget(&self, field: Field) -> Result<Option<u64>, FieldError> {
        let parsed = match self.cell(field) {
            Cell::Absent => return Ok(None),
            Cell::Text(s) => parse_budget_text(s),
            Cell::Other(Value::Number(n)) if self.mode == Mode::Form => parse_budget_number(n),
            Cell::Other(_) => Err(BudgetFault::NotWhole),
        };
        parsed.map(Some).map_err(|fault| self.error(field, fault.message()))
    }

    fn notes(&self) -> Result<Option<String>, FieldError> {
        match self.cell(NOTES) {
            Cell::Absent => Ok(None),
            Cell::Other(_) => Err(self.not_text(NOTES)),
            Cell::Text(s) if s.chars().count() > NOTES_MAX_CHARS => {
                Err(self.error(NOTES, "Notes must not exceed 1000 characters"))
            }
            Cell::Text(s) => Ok(Some(s.to_owned())),
        }
    }

    fn tags(&self, separator: TagSeparator) -> Result<Vec<String>, FieldError> {
        let invalid = || self.error(TAGS, "Tags must be a list of strings");
        match self.cell(TAGS) {
            Cell::Absent => Ok(Vec::new()),
            Cell::Text(s) => Ok(separator.split(s)),
            Cell::Other(Value::Array(items)) if self.mode == Mode::Form => items
                .iter()
                .map(|item| item.as_str().map(str::trim).ok_or_else(invalid))
                .filter(|tag| !matches!(tag, Ok(t) if t.is_empty()))
                .map(|tag| tag.map(str::to_owned))
                .collect(),
            Cell::Other(_) => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BudgetFault {
    NotWhole,
    Negative,
    TooLarge,
}

impl BudgetFault {
    fn message(self) -> &'static str {
        match self {
            BudgetFault::NotWhole => "Budget must be a whole number",
            BudgetFault::Negative => "Budget cannot be negative",
            BudgetFault::TooLarge => "Budget is too large",
        }
    }
}

/// Accepts optionally signed ASCII digits with an optional all-zero fraction.
fn parse_budget_text(s: &str) -> Result<u64, BudgetFault> {
    let s = s.trim();
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = match unsigned.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        Some(_) => return Err(BudgetFault::NotWhole),
        None => unsigned,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BudgetFault::NotWhole);
    }

    match digits.parse::<u64>() {
        Ok(0) => Ok(0),
        _ if negative => Err(BudgetFault::Negative),
        Ok(n) if n <= MAX_BUDGET => Ok(n),
        _ => Err(BudgetFault::TooLarge),
    }
}

fn parse_budget_number(n: &serde_json::Number) -> Result<u64, BudgetFault> {
    if let Some(v) = n.as_u64() {
        return if v <= MAX_BUDGET {
            Ok(v)
        } else {
            Err(BudgetFault::TooLarge)
        };
    }
    if n.as_i64().is_some() {
        return Err(BudgetFault::Negative);
    }
    match n.as_f64() {
        Some(f) if !f.is_finite() || f.fract() != 0.0 => Err(BudgetFault::NotWhole),
        Some(f) if f < 0.0 => Err(BudgetFault::Negative),
        Some(f) if f <= MAX_BUDGET as f64 => Ok(f as u64),
        Some(_) => Err(BudgetFault::TooLarge),
        None => Err(BudgetFault::NotWhole),
    }
}

fn is_valid_phone(s: &str) -> bool {
    (10..=15).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && EMAIL_RE.is_match(s)
}
