//! Session record persistence.
//!
//! `SessionStore` is the seam the handlers talk to; `MongoSessionStore` is the
//! managed-database implementation. Every read and delete is scoped to the
//! owning user id.

use crate::models::{SessionQuery, SessionRecord};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{Error as MongoError, ErrorKind},
    options::{FindOptions, IndexOptions, InsertManyOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};

const DUPLICATE_KEY: i32 = 11000;
use service_core::error::AppError;

/// One page of a listing plus the total match count.
#[derive(Debug, Clone)]
pub struct SessionPage {
    pub records: Vec<SessionRecord>,
    pub total: u64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: &SessionRecord) -> Result<(), AppError>;

    /// Inserts every record whose id is not stored yet and returns how many
    /// were new. Callers retry the whole batch on failure.
    async fn insert_many(&self, records: &[SessionRecord]) -> Result<u64, AppError>;

    async fn find_owned(&self, user_id: &str, id: &str) -> Result<Option<SessionRecord>, AppError>;

    async fn list(&self, user_id: &str, query: &SessionQuery) -> Result<SessionPage, AppError>;

    /// Returns `false` when no row with this id belongs to `user_id`.
    async fn delete_owned(&self, user_id: &str, id: &str) -> Result<bool, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoSessionStore {
    client: MongoClient,
    db: Database,
}

impl MongoSessionStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub fn sessions(&self) -> Collection<SessionRecord> {
        self.db.collection("sessions")
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for wellness-service");

        let indexes = [
            ("user_created_idx", doc! { "user_id": 1, "created_at": -1 }),
            ("user_kind_idx", doc! { "user_id": 1, "kind": 1, "created_at": -1 }),
        ];

        for (name, keys) in indexes {
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build();

            self.sessions()
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!(index = name, "Failed to create index: {}", e);
                    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
                })?;
        }

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }
}

fn owner_filter(user_id: &str, query: &SessionQuery) -> Document {
    let mut filter = doc! { "user_id": user_id };
    if let Some(kind) = query.kind {
        filter.insert("kind", kind.as_str());
    }
    filter
}

fn sort_document(query: &SessionQuery) -> Document {
    let direction = query.order.direction();
    let mut sort = Document::new();
    sort.insert(query.sort_by.field_name(), direction);
    // Stable order between rows with equal sort keys.
    sort.insert("_id", direction);
    sort
}

fn db_error(context: &'static str) -> impl Fn(mongodb::error::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {}", context, e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    }
}

/// Number of rejected rows when an unordered insert failed only on rows
/// whose `_id` already exists. Any other failure yields `None`.
fn duplicate_count(e: &MongoError) -> Option<usize> {
    match e.kind.as_ref() {
        ErrorKind::BulkWrite(failure) if failure.write_concern_error.is_none() => {
            only_duplicates(failure.write_errors.iter().flatten().map(|w| w.code))
        }
        _ => None,
    }
}

fn only_duplicates(codes: impl Iterator<Item = i32>) -> Option<usize> {
    let mut count = 0;
    for code in codes {
        if code != DUPLICATE_KEY {
            return None;
        }
        count += 1;
    }
    (count > 0).then_some(count)
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), AppError> {
        self.sessions()
            .insert_one(record, None)
            .await
            .map_err(db_error("Failed to insert session"))?;
        Ok(())
    }

    async fn insert_many(&self, records: &[SessionRecord]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Ok(0);
        }

        let options = InsertManyOptions::builder().ordered(false).build();
        match self.sessions().insert_many(records, options).await {
            Ok(result) => Ok(result.inserted_ids.len() as u64),
            Err(e) => match duplicate_count(&e) {
                Some(duplicates) => {
                    tracing::info!(duplicates, "Skipped session rows that were already stored");
                    Ok((records.len() - duplicates) as u64)
                }
                None => Err(db_error("Failed to insert session batch")(e)),
            },
        }
    }

    async fn find_owned(&self, user_id: &str, id: &str) -> Result<Option<SessionRecord>, AppError> {
        self.sessions()
            .find_one(doc! { "_id": id, "user_id": user_id }, None)
            .await
            .map_err(db_error("Failed to find session"))
    }

    async fn list(&self, user_id: &str, query: &SessionQuery) -> Result<SessionPage, AppError> {
        let filter = owner_filter(user_id, query);

        let total = self
            .sessions()
            .count_documents(filter.clone(), None)
            .await
            .map_err(db_error("Failed to count sessions"))?;

        let Some(skip) = query.skip() else {
            return Ok(SessionPage {
                records: Vec::new(),
                total,
            });
        };

        let find_options = FindOptions::builder()
            .sort(sort_document(query))
            .skip(skip)
            .limit(query.limit as i64)
            .build();

        let cursor = self
            .sessions()
            .find(filter, find_options)
            .await
            .map_err(db_error("Failed to query sessions"))?;

        let records: Vec<SessionRecord> = cursor
            .try_collect()
            .await
            .map_err(db_error("Failed to collect sessions"))?;

        Ok(SessionPage { records, total })
    }

    async fn delete_owned(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .sessions()
            .delete_one(doc! { "_id": id, "user_id": user_id }, None)
            .await
            .map_err(db_error("Failed to delete session"))?;

        Ok(result.deleted_count > 0)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(db_error("MongoDB health check failed"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionKind, SortField, SortOrder};

    #[test]
    fn filter_is_scoped_to_owner_and_kind() {
        let query = SessionQuery::new(None, None, None, None, Some(SessionKind::FitnessPlan));
        let filter = owner_filter("user-1", &query);
        assert_eq!(filter.get_str("user_id").unwrap(), "user-1");
        assert_eq!(filter.get_str("kind").unwrap(), "fitness_plan");
    }

    #[test]
    fn sort_uses_requested_field_then_id() {
        let query = SessionQuery::new(
            None,
            None,
            Some(SortField::Score),
            Some(SortOrder::Asc),
            None,
        );
        let sort = sort_document(&query);
        let keys: Vec<&String> = sort.keys().collect();
        assert_eq!(keys, vec!["score", "_id"]);
        assert_eq!(sort.get_i32("score").unwrap(), 1);
    }

    #[test]
    fn only_duplicate_key_failures_count_as_already_stored() {
        assert_eq!(only_duplicates([11000, 11000].into_iter()), Some(2));
        assert_eq!(only_duplicates([11000, 121].into_iter()), None);
        assert_eq!(only_duplicates(std::iter::empty()), None);
    }
}
