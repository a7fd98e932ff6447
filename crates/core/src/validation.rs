//! Input validation utilities.
//!
//! Request structs carry raw strings; these helpers turn them into validated record fields
//! and report the offending field by name.

use crate::constants::MAX_AGE;
use crate::{RecordError, RecordResult};
use chrono::NaiveDate;
use frontdesk_types::{NonEmptyText, TextError};

fn text_error(field: &str, err: TextError) -> RecordError {
    match err {
        TextError::Empty => RecordError::InvalidInput(format!("{field} is required")),
        TextError::TooLong { max, len } => RecordError::InvalidInput(format!(
            "{field} must be at most {max} characters (got {len})"
        )),
    }
}

/// Validates a required, non-blank text field.
pub fn required_text(field: &str, value: &str) -> RecordResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|err| text_error(field, err))
}

/// Validates a required text field with a maximum length.
pub fn bounded_text(field: &str, value: &str, max: usize) -> RecordResult<NonEmptyText> {
    NonEmptyText::bounded(value, max).map_err(|err| text_error(field, err))
}

/// Trims an optional text field. `Some("")` stays present: it means "intentionally blank".
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

pub fn validate_age(age: u16) -> RecordResult<u8> {
    if age > MAX_AGE {
        return Err(RecordError::InvalidInput(format!(
            "age must be between 0 and {MAX_AGE} (got {age})"
        )));
    }
    u8::try_from(age).map_err(|_| RecordError::InvalidInput(format!("age {age} is out of range")))
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> RecordResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
        RecordError::InvalidInput(format!("{field} '{value}' is not a YYYY-MM-DD date: {err}"))
    })
}

/// Rejects a discharge dated before the admission.
pub fn validate_stay(admission_date: NaiveDate, discharge_date: NaiveDate) -> RecordResult<()> {
    if discharge_date < admission_date {
        return Err(RecordError::InvalidInput(format!(
            "discharge_date {discharge_date} is before admission_date {admission_date}"
        )));
    }
    Ok(())
}
