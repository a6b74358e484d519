use crate::models::{RecordSource, SessionKind, SessionQuery, SessionRecord, SortField, SortOrder};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Default)]
pub struct SessionListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
    pub kind: Option<SessionKind>,
}

impl From<SessionListParams> for SessionQuery {
    fn from(params: SessionListParams) -> Self {
        SessionQuery::new(
            params.page,
            params.limit,
            params.sort_by,
            params.order,
            params.kind,
        )
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub kind: SessionKind,

    #[validate(range(min = 0.0, max = 100.0))]
    pub score: Option<f64>,

    #[serde(default)]
    pub analysis: serde_json::Value,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub image_urls: Vec<String>,

    #[validate(range(min = 0))]
    pub duration_seconds: Option<i64>,
}

impl CreateSessionRequest {
    pub fn into_record(self, user_id: String) -> SessionRecord {
        let mut record = SessionRecord::new(user_id, self.kind);
        record.score = self.score;
        record.analysis = self.analysis;
        record.image_urls = self.image_urls;
        record.duration_seconds = self.duration_seconds;
        record
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub kind: SessionKind,
    pub score: Option<f64>,
    pub analysis: serde_json::Value,
    pub image_urls: Vec<String>,
    pub duration_seconds: Option<i64>,
    pub source: RecordSource,
    pub created_at: String,
}

impl From<SessionRecord> for SessionResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            score: record.score,
            analysis: record.analysis,
            image_urls: record.image_urls,
            duration_seconds: record.duration_seconds,
            source: record.source,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}
