//! Collections, indexes and the schema bootstrap
//!
//! The bootstrap creates both collections and every index the
//! query paths rely on. It is safe to run against a store that is
//! already initialised: existing collections and indexes are left
//! as they are.
//!

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document_store::{DocumentStore, IndexSpec};
use crate::error::{RecordsError, Result};

/// Document field names shared by queries and indexes
pub mod fields {
    pub const ID: &str = "_id";
    pub const APPOINTMENT_ID: &str = "appointmentId";
    pub const PATIENT_ID: &str = "patientId";
    pub const DOCTOR_ID: &str = "doctorId";
    pub const DIAGNOSIS: &str = "diagnosis";
    pub const PRESCRIPTION_DATE: &str = "prescriptionDate";
    pub const IS_ACTIVE: &str = "isActive";
    pub const VISIT_DATE: &str = "visitDate";
    pub const FOLLOW_UP_REQUIRED: &str = "followUpRequired";
    pub const FOLLOW_UP_DATE: &str = "followUpDate";
    pub const LAB_TEST_NAME: &str = "labResults.testName";
}

/// Names of the two collections owned by the records store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionNames {
    pub prescriptions: String,
    pub medical_records: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            prescriptions: String::from("prescriptions"),
            medical_records: String::from("medical_records"),
        }
    }
}

/// How often index creation is attempted before the bootstrap
/// gives up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

pub fn prescription_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::ascending(fields::PATIENT_ID),
        IndexSpec::ascending(fields::DOCTOR_ID),
        IndexSpec::ascending(fields::APPOINTMENT_ID),
        IndexSpec::descending(fields::PRESCRIPTION_DATE),
        IndexSpec::ascending(fields::IS_ACTIVE),
    ]
}

pub fn medical_record_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::ascending(fields::PATIENT_ID),
        IndexSpec::ascending(fields::DOCTOR_ID),
        IndexSpec::descending(fields::VISIT_DATE),
        IndexSpec::text(fields::DIAGNOSIS),
        IndexSpec::ascending(fields::FOLLOW_UP_REQUIRED),
    ]
}

/// Create an index, retrying on failure. Index creation is
/// idempotent, so a retry after a partial failure is harmless.
async fn ensure_index_with_retry<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &str,
    index: &IndexSpec,
    retry: &RetryPolicy,
) -> Result<()> {
    let attempts = retry.attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.ensure_index(collection, index).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < attempts => {
                warn!(
                    collection,
                    index = %index.name(),
                    attempt,
                    error = %err,
                    "index creation failed, retrying"
                );
                tokio::time::sleep(retry.delay()).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(RecordsError::Bootstrap(format!(
                    "could not create index {} on {} after {} attempts: {}",
                    index.name(),
                    collection,
                    attempts,
                    err
                )))
            }
        }
    }
}

/// Create both collections and all their indexes
pub async fn ensure_schema<S: DocumentStore + ?Sized>(
    store: &S,
    collections: &CollectionNames,
    retry: &RetryPolicy,
) -> Result<()> {
    let plan = [
        (&collections.prescriptions, prescription_indexes()),
        (&collections.medical_records, medical_record_indexes()),
    ];
    for (collection, indexes) in plan.iter() {
        store.ensure_collection(collection).await?;
        for index in indexes {
            ensure_index_with_retry(store, collection, index, retry).await?;
        }
        info!(collection = %collection, indexes = indexes.len(), "schema ready");
    }
    Ok(())
}
