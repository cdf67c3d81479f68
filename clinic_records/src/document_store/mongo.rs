use std::collections::HashMap;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use super::{DocumentStore, IndexSpec, Query};
use crate::error::Result;

/// A document store backed by a MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect to the server at `uri` and use the named database.
    ///
    /// The driver connects lazily, so an unreachable server is only
    /// reported by the first operation (see `ping`).
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(String::from("clinic_records"));
        let client = Client::with_options(options)?;
        Ok(Self::from_database(client.database(database)))
    }

    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    /// Round trip to the server, failing if it cannot be reached
    pub async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

/// Server error code for creating a collection that already exists
const NAMESPACE_EXISTS: i32 = 48;

fn is_namespace_exists(kind: &ErrorKind) -> bool {
    matches!(kind, ErrorKind::Command(command_error) if command_error.code == NAMESPACE_EXISTS)
}

/// The driver reports inserted ids keyed by position in the batch
fn ordered_ids(inserted_ids: HashMap<usize, Bson>) -> Vec<ObjectId> {
    let mut inserted: Vec<(usize, Bson)> = inserted_ids.into_iter().collect();
    inserted.sort_by_key(|(position, _)| *position);
    inserted
        .into_iter()
        .filter_map(|(_, id)| id.as_object_id())
        .collect()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let existing = self
            .database
            .list_collection_names(doc! { "name": collection })
            .await?;
        if existing.is_empty() {
            match self.database.create_collection(collection, None).await {
                Ok(()) => {
                    info!(collection, database = self.database.name(), "created collection")
                }
                // created by another initializer since the listing
                Err(err) if is_namespace_exists(&err.kind) => {
                    debug!(collection, "collection already exists")
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> Result<()> {
        let mut options = IndexOptions::default();
        options.name = Some(index.name());
        let model = IndexModel::builder()
            .keys(index.keys())
            .options(options)
            .build();
        self.collection(collection).create_index(model, None).await?;
        debug!(collection, index = %index.name(), "ensured index");
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>> {
        let names = self.collection(collection).list_index_names().await?;
        Ok(names.into_iter().filter(|name| name != "_id_").collect())
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<ObjectId>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let result = self.collection(collection).insert_many(documents, None).await?;
        let ids = ordered_ids(result.inserted_ids);
        debug!(collection, inserted = ids.len(), "inserted documents");
        Ok(ids)
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let mut options = FindOptions::default();
        options.sort = query.sort_document();
        let cursor = self
            .collection(collection)
            .find(query.filter_document(), options)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64> {
        let count = self
            .collection(collection)
            .count_documents(query.filter_document(), None)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn inserted_ids_come_back_in_batch_order() {
        let first = ObjectId::new();
        let second = ObjectId::new();
        let third = ObjectId::new();
        let inserted = HashMap::from([
            (2, Bson::ObjectId(third)),
            (0, Bson::ObjectId(first)),
            (1, Bson::ObjectId(second)),
        ]);
        assert_eq!(ordered_ids(inserted), vec![first, second, third]);
    }

    #[test]
    fn non_object_ids_are_skipped() {
        let id = ObjectId::new();
        let inserted = HashMap::from([(0, Bson::Int32(7)), (1, Bson::ObjectId(id))]);
        assert_eq!(ordered_ids(inserted), vec![id]);
    }

    fn command_error(code: i32, code_name: &str) -> ErrorKind {
        let error: mongodb::error::CommandError = bson::from_document(doc! {
            "code": code,
            "codeName": code_name,
            "errmsg": "command failed",
        })
        .unwrap();
        ErrorKind::Command(error)
    }

    #[test]
    fn existing_collection_error_is_recognised() {
        assert!(is_namespace_exists(&command_error(48, "NamespaceExists")));
    }

    #[test]
    fn other_command_errors_are_not_swallowed() {
        assert!(!is_namespace_exists(&command_error(13, "Unauthorized")));
    }
}
