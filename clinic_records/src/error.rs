//! Error types for the clinical records store
//!

use thiserror::Error;

/// Reasons a draft document is rejected before it reaches
/// the document store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("required field {0} is missing")]
    MissingField(&'static str),
    #[error("{field} must be a positive id, found {value}")]
    NonPositiveId { field: &'static str, value: i64 },
    #[error("{field} value {value} is outside the plausible range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("followUpDate {follow_up} is not after visitDate {visit}")]
    FollowUpNotAfterVisit { visit: String, follow_up: String },
}

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no document with id {id} in collection {collection}")]
    NotFound { collection: String, id: String },
    #[error("document store error: {0}")]
    Store(String),
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(#[from] bson::ser::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(#[from] bson::de::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("schema bootstrap failed: {0}")]
    Bootstrap(String),
}

pub type Result<T> = std::result::Result<T, RecordsError>;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn validation_error_converts_into_records_error() {
        let err: RecordsError = ValidationError::MissingField("diagnosis").into();
        assert!(matches!(
            err,
            RecordsError::Validation(ValidationError::MissingField("diagnosis"))
        ));
        assert_eq!(err.to_string(), "required field diagnosis is missing");
    }

    #[test]
    fn out_of_range_message_names_the_field() {
        let err = ValidationError::OutOfRange {
            field: "heartRate",
            value: 350.0,
            min: 0.0,
            max: 300.0,
        };
        assert!(err.to_string().starts_with("heartRate value 350"));
    }
}
