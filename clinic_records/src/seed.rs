//! Demonstration fixtures
//!
//! Two prescriptions and two medical records for two fictitious
//! patient/doctor pairs: patient 1 seen by doctor 1 for hypertension,
//! and patient 2 seen by doctor 2 for type 2 diabetes. The content
//! matches the clinic's seed script field for field.
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dates::utc_date;
use crate::document_store::DocumentStore;
use crate::error::Result;
use crate::medical_record::{LabResult, NewMedicalRecord, VitalSigns};
use crate::prescription::{Medication, NewPrescription};
use crate::records_store::ClinicalRecords;

/// Whether seeding may add fixtures to collections that already
/// hold documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedPolicy {
    /// Seed a collection only while it is empty
    #[default]
    IfEmpty,
    /// Insert the fixtures every time, duplicating earlier runs
    Always,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub prescriptions: usize,
    pub medical_records: usize,
}

fn fixture_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    utc_date(year, month, day).expect("Fixture dates are valid calendar days")
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub fn fixture_prescriptions() -> Vec<NewPrescription> {
    vec![
        NewPrescription {
            appointment_id: Some(1),
            patient_id: Some(1),
            doctor_id: Some(1),
            patient_name: text("Mehmet Demir"),
            doctor_name: text("Dr. Ahmet Yılmaz"),
            diagnosis: text("Hipertansiyon"),
            medications: vec![
                Medication::new(
                    "Lisinopril",
                    "10 mg",
                    "Günde 1 kez",
                    "30 gün",
                    "Sabah aç karnına alınacak",
                ),
                Medication::new(
                    "Aspirin",
                    "100 mg",
                    "Günde 1 kez",
                    "Sürekli",
                    "Yemeklerden sonra",
                ),
            ],
            instructions: text(
                "Tuz tüketimini azaltın. Düzenli egzersiz yapın. 1 ay sonra kontrole gelin.",
            ),
            prescription_date: Some(fixture_date(2024, 1, 15)),
            is_active: Some(true),
        },
        NewPrescription {
            appointment_id: Some(2),
            patient_id: Some(2),
            doctor_id: Some(2),
            patient_name: text("Zeynep Şahin"),
            doctor_name: text("Dr. Ayşe Kaya"),
            diagnosis: text("Tip 2 Diyabet"),
            medications: vec![Medication::new(
                "Metformin",
                "500 mg",
                "Günde 2 kez",
                "90 gün",
                "Yemeklerle birlikte",
            )],
            instructions: text(
                "Diyet programına uyun. Haftada 3 kez kan şekeri ölçümü yapın. 3 ay sonra kontrole gelin.",
            ),
            prescription_date: Some(fixture_date(2024, 1, 10)),
            is_active: Some(true),
        },
    ]
}

pub fn fixture_medical_records() -> Vec<NewMedicalRecord> {
    vec![
        NewMedicalRecord {
            patient_id: Some(1),
            visit_date: Some(fixture_date(2024, 1, 15)),
            doctor_id: Some(1),
            doctor_name: text("Dr. Ahmet Yılmaz"),
            diagnosis: text("Hipertansiyon"),
            symptoms: vec![
                String::from("Baş ağrısı"),
                String::from("Baş dönmesi"),
                String::from("Yorgunluk"),
            ],
            treatment: text("Antihipertansif ilaç tedavisi başlandı"),
            notes: text("Hasta 150/95 mmHg kan basıncı ile başvurdu. Tuz kısıtlaması önerildi."),
            vital_signs: Some(VitalSigns {
                blood_pressure_systolic: Some(150),
                blood_pressure_diastolic: Some(95),
                heart_rate: Some(78),
                temperature: Some(36.8),
                respiratory_rate: Some(16),
                weight: Some(85.0),
                height: Some(178.0),
            }),
            lab_results: vec![
                LabResult::new("Kan Şekeri", "98", "mg/dL", "70-100", "Normal"),
                LabResult::new("Kolesterol", "210", "mg/dL", "<200", "Hafif yüksek"),
            ],
            follow_up_required: Some(true),
            follow_up_date: Some(fixture_date(2024, 2, 15)),
        },
        NewMedicalRecord {
            patient_id: Some(2),
            visit_date: Some(fixture_date(2024, 1, 10)),
            doctor_id: Some(2),
            doctor_name: text("Dr. Ayşe Kaya"),
            diagnosis: text("Tip 2 Diyabet"),
            symptoms: vec![
                String::from("Çok su içme"),
                String::from("Sık idrara çıkma"),
                String::from("Yorgunluk"),
            ],
            treatment: text("Oral antidiyabetik tedavi başlandı"),
            notes: text("Hasta açlık kan şekeri 145 mg/dL ile başvurdu. Diyet ve egzersiz önerildi."),
            vital_signs: Some(VitalSigns {
                blood_pressure_systolic: Some(130),
                blood_pressure_diastolic: Some(85),
                heart_rate: Some(72),
                temperature: Some(36.6),
                respiratory_rate: Some(14),
                weight: Some(68.0),
                height: Some(165.0),
            }),
            lab_results: vec![
                LabResult::new("Açlık Kan Şekeri", "145", "mg/dL", "70-100", "Yüksek"),
                LabResult::new("HbA1c", "7.2", "%", "<6.5", "Yüksek"),
            ],
            follow_up_required: Some(true),
            follow_up_date: Some(fixture_date(2024, 4, 10)),
        },
    ]
}

/// Insert the fixture set according to the policy. Each collection
/// is checked on its own, so a half-seeded store gets completed.
pub async fn seed_fixtures<S: DocumentStore>(
    records: &ClinicalRecords<S>,
    policy: SeedPolicy,
) -> Result<SeedReport> {
    let (existing_prescriptions, existing_records) = records.collection_sizes().await?;
    let mut report = SeedReport::default();

    if policy == SeedPolicy::Always || existing_prescriptions == 0 {
        report.prescriptions = records
            .insert_prescriptions(fixture_prescriptions())
            .await?
            .len();
    }
    if policy == SeedPolicy::Always || existing_records == 0 {
        report.medical_records = records
            .insert_medical_records(fixture_medical_records())
            .await?
            .len();
    }

    info!(
        ?policy,
        prescriptions = report.prescriptions,
        medical_records = report.medical_records,
        "seeded fixtures"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::document_store::MemoryStore;
    use crate::schema::{CollectionNames, RetryPolicy};

    async fn seeded_store() -> ClinicalRecords<MemoryStore> {
        let records = ClinicalRecords::new(MemoryStore::new(), CollectionNames::default());
        records.ensure_schema(&RetryPolicy::default()).await.unwrap();
        seed_fixtures(&records, SeedPolicy::IfEmpty).await.unwrap();
        records
    }

    #[test]
    fn fixtures_are_valid() {
        let now = fixture_date(2024, 5, 1);
        for draft in fixture_prescriptions() {
            assert!(draft.validate(now).is_ok());
        }
        for draft in fixture_medical_records() {
            assert!(draft.validate(now).is_ok());
        }
    }

    #[tokio::test]
    async fn seeding_inserts_two_of_each() {
        let records = seeded_store().await;
        assert_eq!(records.collection_sizes().await.unwrap(), (2, 2));
    }

    #[tokio::test]
    async fn reseeding_if_empty_does_not_duplicate() {
        let records = seeded_store().await;
        let report = seed_fixtures(&records, SeedPolicy::IfEmpty).await.unwrap();
        assert_eq!(report, SeedReport::default());
        assert_eq!(records.collection_sizes().await.unwrap(), (2, 2));
    }

    #[tokio::test]
    async fn reseeding_always_duplicates_fixtures() {
        let records = seeded_store().await;
        let report = seed_fixtures(&records, SeedPolicy::Always).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                prescriptions: 2,
                medical_records: 2
            }
        );
        assert_eq!(records.collection_sizes().await.unwrap(), (4, 4));
    }

    #[tokio::test]
    async fn rerunning_bootstrap_keeps_index_set() {
        let records = seeded_store().await;
        records.ensure_schema(&RetryPolicy::default()).await.unwrap();
        assert_eq!(records.store().list_indexes("prescriptions").await.unwrap().len(), 5);
        assert_eq!(records.store().list_indexes("medical_records").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn seeded_documents_use_seed_script_shape() {
        use crate::document_store::Query;

        let records = seeded_store().await;
        let documents = records
            .store()
            .find("medical_records", &Query::new().equals("patientId", 1_i64))
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
        let document = &documents[0];
        assert_eq!(document.get_str("diagnosis").unwrap(), "Hipertansiyon");
        assert_eq!(document.get_array("symptoms").unwrap().len(), 3);
        let vitals = document.get_document("vitalSigns").unwrap();
        assert_eq!(vitals.get_i32("heartRate").unwrap(), 78);
        assert_eq!(vitals.get_f64("temperature").unwrap(), 36.8);
        let labs = document.get_array("labResults").unwrap();
        let cholesterol = labs[1].as_document().unwrap();
        assert_eq!(cholesterol.get_str("normalRange").unwrap(), "<200");
        assert!(document.get_bool("followUpRequired").unwrap());
        assert!(document.get_datetime("createdAt").is_ok());
    }
}
