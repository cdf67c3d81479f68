//! Store configuration
//!
//! Read from a YAML file such as
//!
//! ```yaml
//! uri: mongodb://db.clinic.local:27017
//! database: smart_clinic
//! collections:
//!   prescriptions: prescriptions
//!   medicalRecords: medical_records
//! retry:
//!   attempts: 5
//!   delayMs: 250
//! ```
//!
//! Every field is optional and falls back to its default.
//!

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{CollectionNames, RetryPolicy};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "smart_clinic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collections: CollectionNames,
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: String::from(DEFAULT_URI),
            database: String::from(DEFAULT_DATABASE),
            collections: CollectionNames::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_reader<R>(reader: R) -> Result<Self>
    where
        R: Read,
    {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}
