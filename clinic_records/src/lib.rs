//! Persistence for a clinic's prescriptions and medical records
//!
//! The records store validates drafts, writes them to a document
//! store and answers the lookups the clinic dashboard needs. The
//! document store is MongoDB in production and an in-memory store
//! in tests and demos.
//!

pub use config::StoreConfig;
pub use document_store::{DocumentStore, MemoryStore, MongoStore};
pub use error::{RecordsError, Result, ValidationError};
pub use medical_record::{LabResult, MedicalRecord, NewMedicalRecord, VitalSigns};
pub use prescription::{Medication, NewPrescription, Prescription};
pub use records_store::ClinicalRecords;
pub use schema::{CollectionNames, RetryPolicy};
pub use seed::{seed_fixtures, SeedPolicy, SeedReport};

pub mod config;
pub mod dates;
pub mod document_store;
pub mod error;
pub mod medical_record;
pub mod prescription;
pub mod records_store;
pub mod schema;
pub mod seed;
pub mod seeded_rng;
pub mod synth_data;
mod validation;
mod whole_number;
