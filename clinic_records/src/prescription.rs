//! Prescription documents
//!
//! A prescription is issued by a doctor during one appointment and
//! records the diagnosis, the medications and the overall care
//! instructions. Patient and doctor names are copied onto the
//! document for display and are not kept in sync with the people
//! they refer to.
//!

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::require_id;
use crate::whole_number::WholeNumber;

pub use medication::Medication;

mod medication;

/// A stored prescription
#[serde_with::serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde_as(as = "WholeNumber")]
    pub appointment_id: i64,
    #[serde_as(as = "WholeNumber")]
    pub patient_id: i64,
    #[serde_as(as = "WholeNumber")]
    pub doctor_id: i64,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub diagnosis: String,
    /// May be empty for instructions-only guidance
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub instructions: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub prescription_date: DateTime<Utc>,
    pub is_active: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A prescription as submitted by a clinician, before validation.
///
/// Every field the stored document requires is optional here so
/// that a request with missing references can be represented and
/// rejected with the name of the missing field.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub appointment_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    pub instructions: Option<String>,
    /// Defaults to the creation time when absent
    pub prescription_date: Option<DateTime<Utc>>,
    /// Defaults to true when absent
    pub is_active: Option<bool>,
}

impl NewPrescription {
    /// Check the required references and build the document that
    /// will be stored. `created_at` is stamped onto the result and
    /// also stands in for a missing prescription date.
    pub fn validate(self, created_at: DateTime<Utc>) -> Result<Prescription, ValidationError> {
        let appointment_id = require_id(self.appointment_id, "appointmentId")?;
        let patient_id = require_id(self.patient_id, "patientId")?;
        let doctor_id = require_id(self.doctor_id, "doctorId")?;
        let created_at = crate::dates::to_store_precision(created_at);
        let prescription_date = self
            .prescription_date
            .map(crate::dates::to_store_precision)
            .unwrap_or(created_at);

        Ok(Prescription {
            id: None,
            appointment_id,
            patient_id,
            doctor_id,
            patient_name: self.patient_name.unwrap_or_default(),
            doctor_name: self.doctor_name.unwrap_or_default(),
            diagnosis: self.diagnosis.unwrap_or_default(),
            medications: self.medications,
            instructions: self.instructions.unwrap_or_default(),
            prescription_date,
            is_active: self.is_active.unwrap_or(true),
            created_at,
        })
    }
}
