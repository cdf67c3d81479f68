use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;
use tracing::debug;

use super::{DocumentStore, IndexSpec, Query};
use crate::error::Result;

#[derive(Debug, Default)]
struct Collection {
    documents: Vec<Document>,
    indexes: BTreeSet<String>,
}

/// An in-process document store.
///
/// Documents are kept in insertion order and queries scan the whole
/// collection. Index definitions are recorded so that bootstrapping
/// behaves as it does against a real database, but they are not used
/// to answer queries. Clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the collections that exist
    pub async fn collection_names(&self) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .indexes
            .insert(index.name());
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|found| found.indexes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<ObjectId>> {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        let mut ids = Vec::with_capacity(documents.len());
        for mut document in documents {
            let id = match document.get("_id") {
                Some(Bson::ObjectId(id)) => *id,
                _ => {
                    let id = ObjectId::new();
                    document.insert("_id", id);
                    id
                }
            };
            ids.push(id);
            target.documents.push(document);
        }
        debug!(collection, inserted = ids.len(), "inserted documents");
        Ok(ids)
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(collection)
            .map(|target| {
                target
                    .documents
                    .iter()
                    .filter(|document| query.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        query.sort_documents(&mut found);
        Ok(found)
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|target| {
                target
                    .documents
                    .iter()
                    .filter(|document| query.matches(document))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::document_store::Direction;
    use bson::doc;

    #[tokio::test]
    async fn ensuring_twice_keeps_one_index() {
        let store = MemoryStore::new();
        store.ensure_collection("prescriptions").await.unwrap();
        store.ensure_collection("prescriptions").await.unwrap();
        let index = IndexSpec::ascending("patientId");
        store.ensure_index("prescriptions", &index).await.unwrap();
        store.ensure_index("prescriptions", &index).await.unwrap();
        assert_eq!(
            store.list_indexes("prescriptions").await.unwrap(),
            vec![String::from("patientId_1")]
        );
        assert_eq!(store.collection_names().await, vec![String::from("prescriptions")]);
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_keeps_given_ones() {
        let store = MemoryStore::new();
        let existing = ObjectId::new();
        let ids = store
            .insert_many(
                "medical_records",
                vec![doc! { "_id": existing, "patientId": 1_i64 }, doc! { "patientId": 2_i64 }],
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], existing);
        assert_ne!(ids[1], existing);

        let found = store
            .find("medical_records", &Query::new().equals("_id", ids[1]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_i64("patientId").unwrap(), 2);
    }

    #[tokio::test]
    async fn find_filters_and_sorts() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "prescriptions",
                vec![
                    doc! { "patientId": 1_i64, "rank": 1 },
                    doc! { "patientId": 2_i64, "rank": 5 },
                    doc! { "patientId": 1_i64, "rank": 3 },
                ],
            )
            .await
            .unwrap();
        let query = Query::new()
            .equals("patientId", 1_i64)
            .sort_by("rank", Direction::Descending);
        let found = store.find("prescriptions", &query).await.unwrap();
        let ranks: Vec<i32> = found.iter().map(|document| document.get_i32("rank").unwrap()).collect();
        assert_eq!(ranks, vec![3, 1]);
        assert_eq!(store.count("prescriptions", &query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.find("nothing", &Query::new()).await.unwrap().is_empty());
        assert_eq!(store.count("nothing", &Query::new()).await.unwrap(), 0);
        assert!(store.list_indexes("nothing").await.unwrap().is_empty());
    }
}
