//! The persistence substrate behind the records store
//!
//! The records store only needs a handful of capabilities from a
//! document database: creating collections and indexes, inserting
//! batches of documents and finding documents by a predicate with
//! a sort order. Those capabilities are the DocumentStore trait.
//! Predicates are described by a backend-neutral Query, which each
//! backend translates into its own terms.
//!

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::{Direction, Filter, Query, SortOrder};

mod memory;
mod mongo;
mod query;

/// The kind of index built on a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    Ascending,
    Descending,
    /// Full-text index over a string field
    Text,
}

/// A single-field index on a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    pub field: String,
    pub kind: IndexKind,
}

impl IndexSpec {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: IndexKind::Ascending,
        }
    }

    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: IndexKind::Descending,
        }
    }

    pub fn text(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: IndexKind::Text,
        }
    }

    /// The index name, following MongoDB's default naming
    /// (e.g. "patientId_1", "visitDate_-1", "diagnosis_text")
    pub fn name(&self) -> String {
        let suffix = match self.kind {
            IndexKind::Ascending => "1",
            IndexKind::Descending => "-1",
            IndexKind::Text => "text",
        };
        format!("{}_{}", self.field, suffix)
    }

    /// The index key document
    pub fn keys(&self) -> Document {
        let mut keys = Document::new();
        match self.kind {
            IndexKind::Ascending => keys.insert(self.field.clone(), 1),
            IndexKind::Descending => keys.insert(self.field.clone(), -1),
            IndexKind::Text => keys.insert(self.field.clone(), "text"),
        };
        keys
    }
}

/// A document database holding named collections of BSON documents.
///
/// Creating a collection or an index that already exists must
/// succeed without changing anything.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the collection if it does not exist
    async fn ensure_collection(&self, collection: &str) -> Result<()>;

    /// Create the index if it does not exist
    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> Result<()>;

    /// Names of the indexes on a collection, excluding the
    /// implicit index on the document id
    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>>;

    /// Insert documents, assigning an id to any document without
    /// one. Returns the ids in insertion order.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<ObjectId>>;

    /// Documents matching every filter of the query, in the query's
    /// sort order
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;

    /// Number of documents matching the query
    async fn count(&self, collection: &str, query: &Query) -> Result<u64>;
}

#[cfg(test)]
mod tests {

    use super::*;
    use bson::doc;

    #[test]
    fn index_names_follow_mongodb_defaults() {
        assert_eq!(IndexSpec::ascending("patientId").name(), "patientId_1");
        assert_eq!(IndexSpec::descending("visitDate").name(), "visitDate_-1");
        assert_eq!(IndexSpec::text("diagnosis").name(), "diagnosis_text");
    }

    #[test]
    fn index_keys_carry_direction() {
        assert_eq!(IndexSpec::ascending("isActive").keys(), doc! { "isActive": 1 });
        assert_eq!(
            IndexSpec::descending("prescriptionDate").keys(),
            doc! { "prescriptionDate": -1 }
        );
        assert_eq!(IndexSpec::text("diagnosis").keys(), doc! { "diagnosis": "text" });
    }
}
