//! Small checks used when turning drafts into stored documents

use crate::error::ValidationError;

/// Unwrap a required field or report it as missing
pub fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

/// A required reference id, which must also be positive
pub fn require_id(value: Option<i64>, field: &'static str) -> Result<i64, ValidationError> {
    let id = require(value, field)?;
    if id <= 0 {
        return Err(ValidationError::NonPositiveId { field, value: id });
    }
    Ok(id)
}

/// A required free-text field; blank text counts as missing
pub fn require_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Check an optional measurement against an inclusive range.
/// Absent values are accepted.
pub fn check_range(
    value: Option<f64>,
    field: &'static str,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.is_nan() || value < min || value > max => {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn missing_id_is_reported_by_name() {
        assert_eq!(
            require_id(None, "patientId"),
            Err(ValidationError::MissingField("patientId"))
        );
    }

    #[test]
    fn zero_id_is_rejected() {
        assert_eq!(
            require_id(Some(0), "doctorId"),
            Err(ValidationError::NonPositiveId {
                field: "doctorId",
                value: 0
            })
        );
        assert_eq!(require_id(Some(7), "doctorId"), Ok(7));
    }

    #[test]
    fn blank_text_counts_as_missing() {
        assert!(require_text(Some(String::from("   ")), "diagnosis").is_err());
        assert_eq!(
            require_text(Some(String::from("Hipertansiyon")), "diagnosis"),
            Ok(String::from("Hipertansiyon"))
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(check_range(Some(30.0), "temperature", 30.0, 45.0).is_ok());
        assert!(check_range(Some(45.0), "temperature", 30.0, 45.0).is_ok());
        assert!(check_range(Some(45.1), "temperature", 30.0, 45.0).is_err());
        assert!(check_range(Some(f64::NAN), "temperature", 30.0, 45.0).is_err());
        assert!(check_range(None, "temperature", 30.0, 45.0).is_ok());
    }
}
