//! Leads back out to CSV, in the layout the importer reads.

use crate::error::ExportError;
use crate::lead::{Lead, TagSeparator};
use std::io::Write;

/// Renders `leads` as CSV text with the comma tag separator.
///
/// ```rust
/// use leadgate::{ingest, to_csv};
///
/// let csv = "fullName,phone,city,propertyType,purpose,timeline,source,tags\n\
///            Asha Rao,9876543210,Mohali,Plot,Buy,>6m,Walk-in,\"vip, nri\"\n";
/// let leads = ingest(csv).accepted;
///
/// let exported = to_csv(&leads).unwrap();
/// assert_eq!(ingest(&exported).accepted, leads);
/// ```
///
/// # Errors
///
/// [`ExportError::AmbiguousTag`] if a tag contains a comma.
pub fn to_csv(leads: &[Lead]) -> Result<String, ExportError> {
    to_csv_with(leads, TagSeparator::default())
}

/// Renders `leads` as CSV text, joining tags with `separator`.
///
/// # Errors
///
/// See [`write_csv`].
pub fn to_csv_with(leads: &[Lead], separator: TagSeparator) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, leads, separator)?;
    Ok(String::from_utf8(buf)?)
}

/// Writes a header row and one row per lead to `writer`.
///
/// Nothing is written when any tag contains `separator`.
///
/// # Errors
///
/// [`ExportError::AmbiguousTag`] for a tag containing the separator,
/// [`ExportError::Csv`] or [`ExportError::Flush`] when writing fails.
pub fn write_csv<W: Write>(
    writer: W,
    leads: &[Lead],
    separator: TagSeparator,
) -> Result<(), ExportError> {
    let sep = separator.as_char();
    if let Some(tag) = leads
        .iter()
        .flat_map(|lead| lead.tags.iter())
        .find(|tag| tag.contains(sep))
    {
        return Err(ExportError::AmbiguousTag {
            tag: tag.clone(),
            separator: sep,
        });
    }

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(Lead::FIELDS)?;
    for lead in leads {
        out.write_record(row_cells(lead, separator))?;
    }
    out.flush().map_err(|e| ExportError::Flush(e.to_string()))
}

fn row_cells(lead: &Lead, separator: TagSeparator) -> [String; 14] {
    let opt = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
    [
        lead.full_name.clone(),
        lead.email.clone().unwrap_or_default(),
        lead.phone.clone(),
        lead.city.label().to_owned(),
        lead.property_type.label().to_owned(),
        lead.bhk.map(|b| b.label().to_owned()).unwrap_or_default(),
        lead.purpose.label().to_owned(),
        opt(lead.budget_min),
        opt(lead.budget_max),
        lead.timeline.label().to_owned(),
        lead.source.label().to_owned(),
        lead.notes.clone().unwrap_or_default(),
        separator.join(&lead.tags),
        lead.status.label().to_owned(),
    ]
}
