//! Session records: one stored result of a user interaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    PostureCheck,
    TherapistChat,
    FitnessPlan,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::PostureCheck => "posture_check",
            SessionKind::TherapistChat => "therapist_chat",
            SessionKind::FitnessPlan => "fitness_plan",
        }
    }
}

/// How a row entered the database.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    #[default]
    Remote,
    Migrated,
}

/// A flat session row. `analysis` is whatever the AI call produced, kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub kind: SessionKind,
    pub score: Option<f64>,
    #[serde(default)]
    pub analysis: serde_json::Value,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub source: RecordSource,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(user_id: String, kind: SessionKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            kind,
            score: None,
            analysis: serde_json::Value::Null,
            image_urls: Vec::new(),
            duration_seconds: None,
            source: RecordSource::Remote,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
