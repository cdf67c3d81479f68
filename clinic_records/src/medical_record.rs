//! Medical record documents
//!
//! A medical record is the doctor's account of one patient visit:
//! the diagnosis, symptoms, treatment and notes, together with the
//! vital signs taken and any lab results. A record can flag that the
//! patient needs to come back, in which case it carries the date of
//! the follow-up visit.
//!

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::dates::to_store_precision;
use crate::error::ValidationError;
use crate::validation::{require, require_id, require_text};
use crate::whole_number::WholeNumber;

pub use lab_result::{LabResult, NormalRange};
pub use vital_signs::VitalSigns;

mod lab_result;
mod vital_signs;

/// A stored medical record
#[serde_with::serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde_as(as = "WholeNumber")]
    pub patient_id: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub visit_date: DateTime<Utc>,
    #[serde_as(as = "WholeNumber")]
    pub doctor_id: i64,
    #[serde(default)]
    pub doctor_name: String,
    pub diagnosis: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub lab_results: Vec<LabResult>,
    #[serde(default)]
    pub follow_up_required: bool,
    /// Only meaningful when follow_up_required is set
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[serde_as(as = "Option<bson::DateTime>")]
    pub follow_up_date: Option<DateTime<Utc>>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl MedicalRecord {
    /// Lab results that fall outside their reference range
    pub fn abnormal_lab_results(&self) -> impl Iterator<Item = &LabResult> {
        self.lab_results
            .iter()
            .filter(|lab_result| lab_result.is_within_normal_range() == Some(false))
    }
}

/// A medical record as submitted by a clinician, before validation
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub patient_id: Option<i64>,
    pub visit_date: Option<DateTime<Utc>>,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub lab_results: Vec<LabResult>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl NewMedicalRecord {
    /// Check required fields, vital sign ranges and the follow-up
    /// date, and build the document that will be stored.
    ///
    /// A record that requires follow-up must name a follow-up date
    /// strictly after the visit.
    pub fn validate(self, created_at: DateTime<Utc>) -> Result<MedicalRecord, ValidationError> {
        let patient_id = require_id(self.patient_id, "patientId")?;
        let doctor_id = require_id(self.doctor_id, "doctorId")?;
        let visit_date = to_store_precision(require(self.visit_date, "visitDate")?);
        let diagnosis = require_text(self.diagnosis, "diagnosis")?;

        if let Some(vital_signs) = &self.vital_signs {
            vital_signs.validate()?;
        }

        let follow_up_required = self.follow_up_required.unwrap_or(false);
        let follow_up_date = self.follow_up_date.map(to_store_precision);
        if follow_up_required {
            let follow_up = require(follow_up_date, "followUpDate")?;
            if follow_up <= visit_date {
                return Err(ValidationError::FollowUpNotAfterVisit {
                    visit: visit_date.to_rfc3339(),
                    follow_up: follow_up.to_rfc3339(),
                });
            }
        }

        Ok(MedicalRecord {
            id: None,
            patient_id,
            visit_date,
            doctor_id,
            doctor_name: self.doctor_name.unwrap_or_default(),
            diagnosis,
            symptoms: self.symptoms,
            treatment: self.treatment.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            vital_signs: self.vital_signs,
            lab_results: self.lab_results,
            follow_up_required,
            follow_up_date,
            created_at: to_store_precision(created_at),
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::dates::utc_date;

    fn draft() -> NewMedicalRecord {
        NewMedicalRecord {
            patient_id: Some(1),
            visit_date: utc_date(2024, 1, 15),
            doctor_id: Some(1),
            doctor_name: Some(String::from("Dr. Ahmet Yılmaz")),
            diagnosis: Some(String::from("Hipertansiyon")),
            symptoms: vec![String::from("Baş ağrısı")],
            vital_signs: Some(VitalSigns {
                blood_pressure_systolic: Some(150),
                blood_pressure_diastolic: Some(95),
                ..Default::default()
            }),
            lab_results: vec![
                LabResult::new("Kan Şekeri", "98", "mg/dL", "70-100", "Normal"),
                LabResult::new("Kolesterol", "210", "mg/dL", "<200", "Hafif yüksek"),
            ],
            follow_up_required: Some(true),
            follow_up_date: utc_date(2024, 2, 15),
            ..Default::default()
        }
    }

    fn created_at() -> DateTime<Utc> {
        utc_date(2024, 1, 15).unwrap()
    }

    #[test]
    fn missing_diagnosis_is_rejected() {
        let mut new = draft();
        new.diagnosis = None;
        assert_eq!(
            new.validate(created_at()),
            Err(ValidationError::MissingField("diagnosis"))
        );
    }

    #[test]
    fn missing_visit_date_is_rejected() {
        let mut new = draft();
        new.visit_date = None;
        assert_eq!(
            new.validate(created_at()),
            Err(ValidationError::MissingField("visitDate"))
        );
    }

    #[test]
    fn missing_references_are_rejected() {
        let mut new = draft();
        new.patient_id = None;
        assert_eq!(
            new.validate(created_at()),
            Err(ValidationError::MissingField("patientId"))
        );

        let mut new = draft();
        new.doctor_id = None;
        assert_eq!(
            new.validate(created_at()),
            Err(ValidationError::MissingField("doctorId"))
        );
    }

    #[test]
    fn follow_up_requires_a_date() {
        let mut new = draft();
        new.follow_up_date = None;
        assert_eq!(
            new.validate(created_at()),
            Err(ValidationError::MissingField("followUpDate"))
        );
    }

    #[test]
    fn follow_up_on_the_visit_day_is_rejected() {
        let mut new = draft();
        new.follow_up_date = new.visit_date;
        assert!(matches!(
            new.validate(created_at()),
            Err(ValidationError::FollowUpNotAfterVisit { .. })
        ));
    }

    #[test]
    fn no_follow_up_needs_no_date() {
        let mut new = draft();
        new.follow_up_required = None;
        new.follow_up_date = None;
        let record = new.validate(created_at()).unwrap();
        assert!(!record.follow_up_required);
        assert_eq!(record.follow_up_date, None);
    }

    #[test]
    fn implausible_vitals_are_rejected() {
        let mut new = draft();
        new.vital_signs = Some(VitalSigns {
            temperature: Some(12.0),
            ..Default::default()
        });
        assert!(matches!(
            new.validate(created_at()),
            Err(ValidationError::OutOfRange {
                field: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn abnormal_lab_results_are_listed() {
        let record = draft().validate(created_at()).unwrap();
        let abnormal: Vec<_> = record
            .abnormal_lab_results()
            .map(|lab_result| lab_result.test_name.as_str())
            .collect();
        assert_eq!(abnormal, vec!["Kolesterol"]);
    }

    #[test]
    fn bson_round_trip_keeps_nested_documents() {
        let record = draft().validate(created_at()).unwrap();
        let document = bson::to_document(&record).unwrap();

        let vital_signs = document.get_document("vitalSigns").unwrap();
        assert_eq!(vital_signs.get_i32("bloodPressureSystolic").unwrap(), 150);
        assert!(!vital_signs.contains_key("heartRate"));
        assert_eq!(document.get_array("labResults").unwrap().len(), 2);
        assert!(matches!(
            document.get("followUpDate"),
            Some(bson::Bson::DateTime(_))
        ));

        let decoded: MedicalRecord = bson::from_document(document).unwrap();
        assert_eq!(decoded, record);
    }
}
