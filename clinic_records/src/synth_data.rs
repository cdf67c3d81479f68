//! Synthetic prescriptions and medical records for demo environments
//! that need more than the fixture set.
//!
//! Each collection is generated from its own random number generator
//! (see seeded_rng), so the same global seed always produces the same
//! documents. Every generated draft passes validation: vital signs stay
//! in plausible ranges and follow-up visits fall after the visit.
//!

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::dates::utc_date;
use crate::medical_record::{LabResult, NewMedicalRecord, VitalSigns};
use crate::prescription::{Medication, NewPrescription};
use crate::seeded_rng::make_rng;

/// A condition the generator can diagnose, with the medication and
/// the lab test that usually go with it
struct Condition {
    diagnosis: &'static str,
    symptoms: &'static [&'static str],
    treatment: &'static str,
    /// name, dosage, frequency, duration, instructions
    medication: (&'static str, &'static str, &'static str, &'static str, &'static str),
    /// test name, unit, normal range, lowest and highest result
    lab_test: (&'static str, &'static str, &'static str, f64, f64),
}

const CONDITIONS: [Condition; 4] = [
    Condition {
        diagnosis: "Hipertansiyon",
        symptoms: &["Baş ağrısı", "Baş dönmesi", "Yorgunluk"],
        treatment: "Antihipertansif ilaç tedavisi başlandı",
        medication: ("Lisinopril", "10 mg", "Günde 1 kez", "30 gün", "Sabah aç karnına alınacak"),
        lab_test: ("Kolesterol", "mg/dL", "<200", 150.0, 260.0),
    },
    Condition {
        diagnosis: "Tip 2 Diyabet",
        symptoms: &["Çok su içme", "Sık idrara çıkma", "Yorgunluk"],
        treatment: "Oral antidiyabetik tedavi başlandı",
        medication: ("Metformin", "500 mg", "Günde 2 kez", "90 gün", "Yemeklerle birlikte"),
        lab_test: ("HbA1c", "%", "<6.5", 5.0, 9.5),
    },
    Condition {
        diagnosis: "Migren",
        symptoms: &["Zonklayıcı baş ağrısı", "Bulantı", "Işığa hassasiyet"],
        treatment: "Atak tedavisi ve tetikleyicilerden kaçınma önerildi",
        medication: ("Sumatriptan", "50 mg", "Gerektiğinde", "10 gün", "Atak başında alınacak"),
        lab_test: ("Hemoglobin", "g/dL", "12-16", 10.0, 17.0),
    },
    Condition {
        diagnosis: "Astım",
        symptoms: &["Nefes darlığı", "Hırıltılı solunum", "Öksürük"],
        treatment: "İnhaler tedavi düzenlendi",
        medication: ("Salbutamol", "100 mcg", "Gerektiğinde", "Sürekli", "2 puf inhale edilecek"),
        lab_test: ("Eozinofil", "%", "1-4", 0.5, 9.0),
    },
];

const DOCTORS: [(i64, &str); 3] = [
    (1, "Dr. Ahmet Yılmaz"),
    (2, "Dr. Ayşe Kaya"),
    (3, "Dr. Mustafa Çelik"),
];

const PATIENT_NAMES: [&str; 6] = [
    "Mehmet Demir",
    "Zeynep Şahin",
    "Ali Öztürk",
    "Elif Arslan",
    "Can Yıldız",
    "Selin Aydın",
];

/// First appointment id used for synthetic prescriptions, well clear
/// of the fixture appointments
const FIRST_APPOINTMENT_ID: i64 = 1000;

fn pick_condition(rng: &mut ChaCha8Rng) -> &'static Condition {
    &CONDITIONS[rng.gen_range(0..CONDITIONS.len())]
}

fn pick_doctor(rng: &mut ChaCha8Rng) -> (i64, &'static str) {
    DOCTORS[rng.gen_range(0..DOCTORS.len())]
}

/// Patient ids are 1-based indexes into the synthetic patient names
fn pick_patient(rng: &mut ChaCha8Rng) -> (i64, &'static str) {
    let index = rng.gen_range(0..PATIENT_NAMES.len());
    (index as i64 + 1, PATIENT_NAMES[index])
}

/// A day in 2023 or 2024
fn make_visit_date(rng: &mut ChaCha8Rng) -> DateTime<Utc> {
    let start = utc_date(2023, 1, 1).expect("Start of the synthetic date range is a valid day");
    start + Duration::days(rng.gen_range(0..730))
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn make_vital_signs(rng: &mut ChaCha8Rng) -> VitalSigns {
    let systolic = rng.gen_range(100..=170);
    VitalSigns {
        blood_pressure_systolic: Some(systolic),
        blood_pressure_diastolic: Some(systolic - rng.gen_range(30..=60)),
        heart_rate: Some(rng.gen_range(55..=110)),
        temperature: Some(round_to_tenth(rng.gen_range(36.0..38.5))),
        respiratory_rate: Some(rng.gen_range(12..=22)),
        weight: Some(round_to_tenth(rng.gen_range(45.0..120.0))),
        height: Some(rng.gen_range(150..=195) as f64),
    }
}

fn make_lab_result(rng: &mut ChaCha8Rng, condition: &Condition) -> LabResult {
    let (test_name, unit, normal_range, lowest, highest) = condition.lab_test;
    let result = format!("{:.1}", rng.gen_range(lowest..highest));
    let mut lab_result = LabResult::new(test_name, result, unit, normal_range, "");
    lab_result.notes = match lab_result.is_within_normal_range() {
        Some(true) => String::from("Normal"),
        Some(false) => String::from("Referans dışı"),
        None => String::new(),
    };
    lab_result
}

/// Make `count` synthetic medical records. About half require a
/// follow-up visit between two and twelve weeks later.
pub fn make_medical_records(global_seed: u64, count: usize) -> Vec<NewMedicalRecord> {
    let mut rng = make_rng(global_seed, "medical_records");
    (0..count)
        .map(|_| {
            let condition = pick_condition(&mut rng);
            let (doctor_id, doctor_name) = pick_doctor(&mut rng);
            let (patient_id, _) = pick_patient(&mut rng);
            let visit_date = make_visit_date(&mut rng);
            let follow_up_required = rng.gen_bool(0.5);
            let follow_up_date = if follow_up_required {
                Some(visit_date + Duration::weeks(rng.gen_range(2..=12)))
            } else {
                None
            };
            NewMedicalRecord {
                patient_id: Some(patient_id),
                visit_date: Some(visit_date),
                doctor_id: Some(doctor_id),
                doctor_name: Some(doctor_name.to_string()),
                diagnosis: Some(condition.diagnosis.to_string()),
                symptoms: condition.symptoms.iter().map(|s| s.to_string()).collect(),
                treatment: Some(condition.treatment.to_string()),
                notes: None,
                vital_signs: Some(make_vital_signs(&mut rng)),
                lab_results: vec![make_lab_result(&mut rng, condition)],
                follow_up_required: Some(follow_up_required),
                follow_up_date,
            }
        })
        .collect()
}

/// Make `count` synthetic prescriptions, each for its own appointment.
/// Roughly one in five is no longer active.
pub fn make_prescriptions(global_seed: u64, count: usize) -> Vec<NewPrescription> {
    let mut rng = make_rng(global_seed, "prescriptions");
    (0..count)
        .map(|n| {
            let condition = pick_condition(&mut rng);
            let (doctor_id, doctor_name) = pick_doctor(&mut rng);
            let (patient_id, patient_name) = pick_patient(&mut rng);
            let (name, dosage, frequency, duration, instructions) = condition.medication;
            NewPrescription {
                appointment_id: Some(FIRST_APPOINTMENT_ID + n as i64),
                patient_id: Some(patient_id),
                doctor_id: Some(doctor_id),
                patient_name: Some(patient_name.to_string()),
                doctor_name: Some(doctor_name.to_string()),
                diagnosis: Some(condition.diagnosis.to_string()),
                medications: vec![Medication::new(name, dosage, frequency, duration, instructions)],
                instructions: Some(condition.treatment.to_string()),
                prescription_date: Some(make_visit_date(&mut rng)),
                is_active: Some(!rng.gen_bool(0.2)),
            }
        })
        .collect()
}
