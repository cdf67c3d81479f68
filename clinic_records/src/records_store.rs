//! The clinical records store
//!
//! ClinicalRecords owns the prescription and medical record
//! collections of a document store. It validates drafts before they
//! are written, stamps the creation time, and answers the queries
//! the clinic dashboard makes. Patient, doctor and appointment ids
//! are plain lookup keys; nothing checks that they refer to
//! existing people or appointments.
//!

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::dates;
use crate::document_store::{Direction, DocumentStore, Query};
use crate::error::{RecordsError, Result};
use crate::medical_record::{MedicalRecord, NewMedicalRecord};
use crate::prescription::{NewPrescription, Prescription};
use crate::schema::{ensure_schema, fields, CollectionNames, RetryPolicy};

pub struct ClinicalRecords<S> {
    store: S,
    collections: CollectionNames,
}

fn decode_all<T: DeserializeOwned>(documents: Vec<bson::Document>) -> Result<Vec<T>> {
    documents
        .into_iter()
        .map(|document| bson::from_document(document).map_err(RecordsError::from))
        .collect()
}

fn encode_all<T: Serialize>(items: &[T]) -> Result<Vec<bson::Document>> {
    items
        .iter()
        .map(|item| bson::to_document(item).map_err(RecordsError::from))
        .collect()
}

fn newest_prescriptions_first(query: Query) -> Query {
    query.sort_by(fields::PRESCRIPTION_DATE, Direction::Descending)
}

fn newest_visits_first(query: Query) -> Query {
    query.sort_by(fields::VISIT_DATE, Direction::Descending)
}

impl<S: DocumentStore> ClinicalRecords<S> {
    pub fn new(store: S, collections: CollectionNames) -> Self {
        Self { store, collections }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collections(&self) -> &CollectionNames {
        &self.collections
    }

    /// Create the collections and indexes this store queries
    pub async fn ensure_schema(&self, retry: &RetryPolicy) -> Result<()> {
        ensure_schema(&self.store, &self.collections, retry).await
    }

    /// Validate and store one prescription
    pub async fn create_prescription(&self, new: NewPrescription) -> Result<Prescription> {
        let mut created = self.insert_prescriptions(vec![new]).await?;
        created
            .pop()
            .ok_or_else(|| RecordsError::Store(String::from("insert returned no id")))
    }

    /// Validate every draft, then store them in one batch. Nothing
    /// is written if any draft is invalid.
    pub async fn insert_prescriptions(&self, drafts: Vec<NewPrescription>) -> Result<Vec<Prescription>> {
        let created_at = dates::now();
        let mut prescriptions = drafts
            .into_iter()
            .map(|draft| draft.validate(created_at))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let ids = self
            .store
            .insert_many(&self.collections.prescriptions, encode_all(&prescriptions)?)
            .await?;
        for (prescription, id) in prescriptions.iter_mut().zip(ids) {
            prescription.id = Some(id);
        }
        debug!(count = prescriptions.len(), "stored prescriptions");
        Ok(prescriptions)
    }

    async fn find_prescriptions(&self, query: Query) -> Result<Vec<Prescription>> {
        debug!(filter = %query.filter_document(), "finding prescriptions");
        let documents = self
            .store
            .find(&self.collections.prescriptions, &query)
            .await?;
        decode_all(documents)
    }

    pub async fn find_prescription(&self, id: ObjectId) -> Result<Prescription> {
        self.find_prescriptions(Query::new().equals(fields::ID, id))
            .await?
            .pop()
            .ok_or_else(|| RecordsError::NotFound {
                collection: self.collections.prescriptions.clone(),
                id: id.to_hex(),
            })
    }

    /// Every prescription, most recent first
    pub async fn find_all_prescriptions(&self) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(Query::new()))
            .await
    }

    /// Prescriptions still in effect, for all patients
    pub async fn find_all_active_prescriptions(&self) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new().equals(fields::IS_ACTIVE, true),
        ))
        .await
    }

    /// A patient's prescriptions, most recent first
    pub async fn find_prescriptions_by_patient(&self, patient_id: i64) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new().equals(fields::PATIENT_ID, patient_id),
        ))
        .await
    }

    /// Prescriptions written by a doctor, most recent first
    pub async fn find_prescriptions_by_doctor(&self, doctor_id: i64) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new().equals(fields::DOCTOR_ID, doctor_id),
        ))
        .await
    }

    pub async fn find_prescriptions_by_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new().equals(fields::APPOINTMENT_ID, appointment_id),
        ))
        .await
    }

    /// A patient's prescriptions that are still in effect
    pub async fn find_active_prescriptions(&self, patient_id: i64) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new()
                .equals(fields::PATIENT_ID, patient_id)
                .equals(fields::IS_ACTIVE, true),
        ))
        .await
    }

    /// A patient's prescriptions dated within the inclusive range
    pub async fn find_prescriptions_in_date_range(
        &self,
        patient_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new()
                .equals(fields::PATIENT_ID, patient_id)
                .between(fields::PRESCRIPTION_DATE, Some(from), Some(to)),
        ))
        .await
    }

    /// A doctor's prescriptions whose diagnosis contains the text,
    /// ignoring case
    pub async fn find_doctor_prescriptions_by_diagnosis(
        &self,
        doctor_id: i64,
        text: &str,
    ) -> Result<Vec<Prescription>> {
        self.find_prescriptions(newest_prescriptions_first(
            Query::new()
                .equals(fields::DOCTOR_ID, doctor_id)
                .contains_text(fields::DIAGNOSIS, text),
        ))
        .await
    }

    pub async fn count_prescriptions_by_patient(&self, patient_id: i64) -> Result<u64> {
        self.store
            .count(
                &self.collections.prescriptions,
                &Query::new().equals(fields::PATIENT_ID, patient_id),
            )
            .await
    }

    pub async fn count_prescriptions_by_doctor(&self, doctor_id: i64) -> Result<u64> {
        self.store
            .count(
                &self.collections.prescriptions,
                &Query::new().equals(fields::DOCTOR_ID, doctor_id),
            )
            .await
    }

    /// Validate and store one medical record
    pub async fn create_medical_record(&self, new: NewMedicalRecord) -> Result<MedicalRecord> {
        let mut created = self.insert_medical_records(vec![new]).await?;
        created
            .pop()
            .ok_or_else(|| RecordsError::Store(String::from("insert returned no id")))
    }

    /// Validate every draft, then store them in one batch. Nothing
    /// is written if any draft is invalid.
    pub async fn insert_medical_records(
        &self,
        drafts: Vec<NewMedicalRecord>,
    ) -> Result<Vec<MedicalRecord>> {
        let created_at = dates::now();
        let mut records = drafts
            .into_iter()
            .map(|draft| draft.validate(created_at))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let ids = self
            .store
            .insert_many(&self.collections.medical_records, encode_all(&records)?)
            .await?;
        for (record, id) in records.iter_mut().zip(ids) {
            record.id = Some(id);
        }
        debug!(count = records.len(), "stored medical records");
        Ok(records)
    }

    async fn find_medical_records(&self, query: Query) -> Result<Vec<MedicalRecord>> {
        debug!(filter = %query.filter_document(), "finding medical records");
        let documents = self
            .store
            .find(&self.collections.medical_records, &query)
            .await?;
        decode_all(documents)
    }

    pub async fn find_medical_record(&self, id: ObjectId) -> Result<MedicalRecord> {
        self.find_medical_records(Query::new().equals(fields::ID, id))
            .await?
            .pop()
            .ok_or_else(|| RecordsError::NotFound {
                collection: self.collections.medical_records.clone(),
                id: id.to_hex(),
            })
    }

    /// A patient's visits, most recent first
    pub async fn find_medical_records_by_patient(&self, patient_id: i64) -> Result<Vec<MedicalRecord>> {
        self.find_medical_records(newest_visits_first(
            Query::new().equals(fields::PATIENT_ID, patient_id),
        ))
        .await
    }

    /// Visits seen by a doctor, most recent first
    pub async fn find_medical_records_by_doctor(&self, doctor_id: i64) -> Result<Vec<MedicalRecord>> {
        self.find_medical_records(newest_visits_first(
            Query::new().equals(fields::DOCTOR_ID, doctor_id),
        ))
        .await
    }

    /// A patient's visits within the inclusive date range
    pub async fn find_medical_records_in_date_range(
        &self,
        patient_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MedicalRecord>> {
        self.find_medical_records(newest_visits_first(
            Query::new()
                .equals(fields::PATIENT_ID, patient_id)
                .between(fields::VISIT_DATE, Some(from), Some(to)),
        ))
        .await
    }

    /// Records whose diagnosis contains the text, ignoring case.
    /// Matches are not ranked; they come back most recent first.
    pub async fn search_diagnosis(&self, text: &str) -> Result<Vec<MedicalRecord>> {
        self.find_medical_records(newest_visits_first(
            Query::new().contains_text(fields::DIAGNOSIS, text),
        ))
        .await
    }

    /// A patient's visits whose diagnosis contains the text,
    /// ignoring case
    pub async fn find_patient_records_by_diagnosis(
        &self,
        patient_id: i64,
        text: &str,
    ) -> Result<Vec<MedicalRecord>> {
        self.find_medical_records(newest_visits_first(
            Query::new()
                .equals(fields::PATIENT_ID, patient_id)
                .contains_text(fields::DIAGNOSIS, text),
        ))
        .await
    }

    /// Records with a lab test whose name contains the text
    pub async fn find_medical_records_by_lab_test(&self, test_name: &str) -> Result<Vec<MedicalRecord>> {
        self.find_medical_records(newest_visits_first(
            Query::new().contains_text(fields::LAB_TEST_NAME, test_name),
        ))
        .await
    }

    fn follow_up_query(cutoff: Option<DateTime<Utc>>) -> Query {
        let query = Query::new().equals(fields::FOLLOW_UP_REQUIRED, true);
        match cutoff {
            Some(cutoff) => query.between(fields::FOLLOW_UP_DATE, None, Some(cutoff)),
            None => query,
        }
    }

    /// Records that require a follow-up visit, soonest first. With a
    /// cutoff, only follow-ups due on or before it are returned.
    pub async fn find_records_needing_follow_up(
        &self,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<MedicalRecord>> {
        let query = Self::follow_up_query(cutoff).sort_by(fields::FOLLOW_UP_DATE, Direction::Ascending);
        self.find_medical_records(query).await
    }

    pub async fn count_records_needing_follow_up(&self, cutoff: Option<DateTime<Utc>>) -> Result<u64> {
        self.store
            .count(&self.collections.medical_records, &Self::follow_up_query(cutoff))
            .await
    }

    pub async fn count_medical_records_by_patient(&self, patient_id: i64) -> Result<u64> {
        self.store
            .count(
                &self.collections.medical_records,
                &Query::new().equals(fields::PATIENT_ID, patient_id),
            )
            .await
    }

    /// Number of stored prescriptions and medical records
    pub async fn collection_sizes(&self) -> Result<(u64, u64)> {
        let prescriptions = self
            .store
            .count(&self.collections.prescriptions, &Query::new())
            .await?;
        let medical_records = self
            .store
            .count(&self.collections.medical_records, &Query::new())
            .await?;
        Ok((prescriptions, medical_records))
    }
}
