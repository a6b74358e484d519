//! In-process `SessionStore` used by tests and local demos without MongoDB.

use super::database::{SessionPage, SessionStore};
use crate::models::{SessionQuery, SessionRecord, SortField, SortOrder};
use async_trait::async_trait;
use service_core::error::AppError;
use std::cmp::Ordering;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionStore {
    records: RwLock<Vec<SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("session store lock poisoned"))
}

// Missing optional values sort first ascending, like MongoDB nulls.
fn compare(a: &SessionRecord, b: &SessionRecord, field: SortField) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Score => a
            .score
            .partial_cmp(&b.score)
            .unwrap_or(Ordering::Equal),
        SortField::DurationSeconds => a.duration_seconds.cmp(&b.duration_seconds),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), AppError> {
        self.records.write().map_err(|_| poisoned())?.push(record.clone());
        Ok(())
    }

    async fn insert_many(&self, records: &[SessionRecord]) -> Result<u64, AppError> {
        let mut stored = self.records.write().map_err(|_| poisoned())?;
        let mut inserted = 0;
        for record in records {
            if stored.iter().all(|r| r.id != record.id) {
                stored.push(record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn find_owned(&self, user_id: &str, id: &str) -> Result<Option<SessionRecord>, AppError> {
        Ok(self
            .records
            .read()
            .map_err(|_| poisoned())?
            .iter()
            .find(|r| r.id == id && r.is_owned_by(user_id))
            .cloned())
    }

    async fn list(&self, user_id: &str, query: &SessionQuery) -> Result<SessionPage, AppError> {
        let mut matching: Vec<SessionRecord> = self
            .records
            .read()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|r| r.is_owned_by(user_id))
            .filter(|r| query.kind.map_or(true, |kind| r.kind == kind))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = compare(a, b, query.sort_by);
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        let skip = query
            .skip()
            .and_then(|skip| usize::try_from(skip).ok())
            .unwrap_or(usize::MAX);
        let records = matching
            .into_iter()
            .skip(skip)
            .take(query.limit as usize)
            .collect();

        Ok(SessionPage { records, total })
    }

    async fn delete_owned(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let before = records.len();
        records.retain(|r| !(r.id == id && r.is_owned_by(user_id)));
        Ok(records.len() < before)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionKind;

    fn record(user: &str, kind: SessionKind, score: Option<f64>) -> SessionRecord {
        let mut r = SessionRecord::new(user.to_string(), kind);
        r.score = score;
        r
    }

    #[tokio::test]
    async fn insert_many_skips_ids_already_stored() {
        let store = InMemorySessionStore::new();
        let batch = vec![
            record("alice", SessionKind::FitnessPlan, None),
            record("alice", SessionKind::TherapistChat, None),
        ];

        assert_eq!(store.insert_many(&batch[..1]).await.unwrap(), 1);
        assert_eq!(store.insert_many(&batch).await.unwrap(), 1);
        assert_eq!(store.insert_many(&batch).await.unwrap(), 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn list_is_scoped_sorted_and_paged() {
        let store = InMemorySessionStore::new();
        for score in [40.0, 90.0, 65.0] {
            store
                .insert(&record("alice", SessionKind::PostureCheck, Some(score)))
                .await
                .unwrap();
        }
        store
            .insert(&record("bob", SessionKind::PostureCheck, Some(99.0)))
            .await
            .unwrap();

        let query = SessionQuery::new(
            Some(1),
            Some(2),
            Some(SortField::Score),
            Some(SortOrder::Desc),
            None,
        );
        let page = store.list("alice", &query).await.unwrap();

        assert_eq!(page.total, 3);
        let scores: Vec<f64> = page.records.iter().filter_map(|r| r.score).collect();
        assert_eq!(scores, vec![90.0, 65.0]);

        let query = SessionQuery::new(Some(2), Some(2), Some(SortField::Score), None, None);
        let page = store.list("alice", &query).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].score, Some(40.0));
    }

    #[tokio::test]
    async fn kind_filter_applies() {
        let store = InMemorySessionStore::new();
        store
            .insert(&record("alice", SessionKind::PostureCheck, None))
            .await
            .unwrap();
        store
            .insert(&record("alice", SessionKind::FitnessPlan, None))
            .await
            .unwrap();

        let query = SessionQuery::new(None, None, None, None, Some(SessionKind::FitnessPlan));
        let page = store.list("alice", &query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].kind, SessionKind::FitnessPlan);
    }

    #[tokio::test]
    async fn delete_requires_ownership() {
        let store = InMemorySessionStore::new();
        let r = record("alice", SessionKind::TherapistChat, None);
        store.insert(&r).await.unwrap();

        assert!(!store.delete_owned("bob", &r.id).await.unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.delete_owned("alice", &r.id).await.unwrap());
        assert!(store.is_empty());
    }
}
