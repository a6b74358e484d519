//! One-time import of browser local-storage history into the session store.
//!
//! Only a fixed set of keys is understood. Anything else is reported back as
//! ignored and never written.

use crate::dtos::{MigrationPreview, MigrationSummary};
use crate::models::{RecordSource, SessionKind, SessionRecord};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Namespace for migrated row ids. Changing it re-imports every snapshot.
const MIGRATED_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_3c2a_8b4e_4f7a_9c05_2e8d_71b3_a640);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalStorageKey {
    PostureSessions,
    PostureReports,
    TherapistChats,
    FitnessPlans,
}

impl LocalStorageKey {
    pub const ALL: [LocalStorageKey; 4] = [
        LocalStorageKey::PostureSessions,
        LocalStorageKey::PostureReports,
        LocalStorageKey::TherapistChats,
        LocalStorageKey::FitnessPlans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocalStorageKey::PostureSessions => "postureSessions",
            LocalStorageKey::PostureReports => "postureReports",
            LocalStorageKey::TherapistChats => "therapistChats",
            LocalStorageKey::FitnessPlans => "fitnessPlans",
        }
    }

    pub fn kind(&self) -> SessionKind {
        match self {
            LocalStorageKey::PostureSessions | LocalStorageKey::PostureReports => {
                SessionKind::PostureCheck
            }
            LocalStorageKey::TherapistChats => SessionKind::TherapistChat,
            LocalStorageKey::FitnessPlans => SessionKind::FitnessPlan,
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

/// What a snapshot contains, split into importable arrays and ignored keys.
#[derive(Debug, Default)]
pub struct MigrationPlan<'a> {
    pub entries: Vec<(LocalStorageKey, &'a [Value])>,
    pub ignored_keys: Vec<String>,
}

impl<'a> MigrationPlan<'a> {
    /// Known keys holding a non-empty array are importable. Unknown keys and
    /// known keys with any other value are ignored; empty arrays are skipped
    /// silently.
    pub fn from_snapshot(local_data: &'a Map<String, Value>) -> Self {
        let mut plan = MigrationPlan::default();

        for (name, value) in local_data {
            match (LocalStorageKey::parse(name), value) {
                (Some(key), Value::Array(items)) => {
                    if !items.is_empty() {
                        plan.entries.push((key, items.as_slice()));
                    }
                }
                _ => plan.ignored_keys.push(name.clone()),
            }
        }

        plan
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn preview(&self) -> MigrationPreview {
        MigrationPreview {
            pending: self.counts(),
            total: self.total(),
            ignored_keys: self.ignored_keys.clone(),
        }
    }

    /// Rows to insert. Ids are derived from the snapshot, so resubmitting
    /// the same data yields the same ids and the store drops the repeats.
    pub fn records(&self, user_id: &str) -> Vec<SessionRecord> {
        let mut seen: HashMap<(LocalStorageKey, String), usize> = HashMap::new();

        self.entries
            .iter()
            .flat_map(|(key, items)| items.iter().map(move |item| (*key, item)))
            .map(|(key, item)| {
                let body = item.to_string();
                let occurrence = seen.entry((key, body.clone())).or_default();
                let id = migrated_id(user_id, key, &body, *occurrence);
                *occurrence += 1;

                let mut record = record_from_local(user_id, key, item);
                record.id = id;
                record
            })
            .collect()
    }

    /// Summary after a successful insert. Every importable key is returned in
    /// `clear_keys`, including ones that held an empty array.
    pub fn summary(&self, local_data: &Map<String, Value>) -> MigrationSummary {
        let clear_keys = LocalStorageKey::ALL
            .iter()
            .filter(|key| matches!(local_data.get(key.as_str()), Some(Value::Array(_))))
            .map(|key| key.as_str().to_string())
            .collect();

        MigrationSummary {
            migrated: self.counts(),
            total: self.total(),
            clear_keys,
            ignored_keys: self.ignored_keys.clone(),
        }
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.entries
            .iter()
            .map(|(key, items)| (key.as_str().to_string(), items.len()))
            .collect()
    }
}

/// Map one local-storage item onto a session row. The item itself is kept
/// verbatim as `analysis`; a few well-known fields are lifted out.
pub fn record_from_local(user_id: &str, key: LocalStorageKey, item: &Value) -> SessionRecord {
    let mut record = SessionRecord::new(user_id.to_string(), key.kind());
    record.source = RecordSource::Migrated;

    if let Value::Object(fields) = item {
        record.score = first_of(fields, &["score", "postureScore"])
            .and_then(Value::as_f64)
            .map(|s| s.clamp(0.0, 100.0));

        record.duration_seconds = first_of(fields, &["duration_seconds", "durationSeconds", "duration"])
            .and_then(|d| d.as_i64().or_else(|| d.as_f64().map(|f| f.round() as i64)))
            .filter(|d| *d >= 0);

        record.image_urls = image_urls(fields);

        if let Some(created_at) =
            first_of(fields, &["createdAt", "created_at", "timestamp", "date"]).and_then(parse_timestamp)
        {
            record.created_at = created_at;
        }
    }

    record.analysis = item.clone();
    record
}

/// Identical items under one key are told apart by how many came before.
fn migrated_id(user_id: &str, key: LocalStorageKey, body: &str, occurrence: usize) -> String {
    let name = format!("{}\n{}\n{}\n{}", user_id, key.as_str(), occurrence, body);
    Uuid::new_v5(&MIGRATED_ID_NAMESPACE, name.as_bytes()).to_string()
}

fn first_of<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|v| !v.is_null())
}

fn image_urls(fields: &Map<String, Value>) -> Vec<String> {
    match first_of(fields, &["image_urls", "imageUrls", "images", "imageUrl"]) {
        Some(Value::String(url)) if !url.is_empty() => vec![url.clone()],
        Some(Value::Array(urls)) => urls
            .iter()
            .filter_map(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// RFC 3339 strings or epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("snapshot must be an object"),
        }
    }

    #[test]
    fn plan_splits_known_and_ignored_keys() {
        let data = snapshot(json!({
            "postureSessions": [{"score": 80}, {"score": 60}],
            "fitnessPlans": [],
            "therapistChats": "not an array",
            "theme": "dark"
        }));

        let plan = MigrationPlan::from_snapshot(&data);
        let preview = plan.preview();

        assert_eq!(preview.total, 2);
        assert_eq!(preview.pending.get("postureSessions"), Some(&2));
        assert!(!preview.pending.contains_key("fitnessPlans"));
        assert_eq!(preview.ignored_keys, vec!["theme", "therapistChats"]);

        let summary = plan.summary(&data);
        assert_eq!(summary.clear_keys, vec!["postureSessions", "fitnessPlans"]);
    }

    #[test]
    fn both_posture_keys_map_to_posture_check() {
        assert_eq!(LocalStorageKey::PostureReports.kind(), SessionKind::PostureCheck);
        assert_eq!(LocalStorageKey::parse("postureSessions"), Some(LocalStorageKey::PostureSessions));
        assert_eq!(LocalStorageKey::parse("posture_sessions"), None);
    }

    #[test]
    fn record_lifts_known_fields() {
        let item = json!({
            "postureScore": 72.5,
            "durationSeconds": 95.4,
            "imageUrl": "https://cdn.example.com/a.jpg",
            "timestamp": 1_700_000_000_000i64,
            "feedback": "Shoulders rounded"
        });

        let record = record_from_local("user-1", LocalStorageKey::PostureReports, &item);

        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.kind, SessionKind::PostureCheck);
        assert_eq!(record.source, RecordSource::Migrated);
        assert_eq!(record.score, Some(72.5));
        assert_eq!(record.duration_seconds, Some(95));
        assert_eq!(record.image_urls, vec!["https://cdn.example.com/a.jpg"]);
        assert_eq!(record.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(record.analysis, item);
    }

    #[test]
    fn record_ids_are_stable_across_submissions() {
        let data = snapshot(json!({
            "postureSessions": [{"score": 80}, {"score": 80}, {"score": 60}],
            "therapistChats": [{"score": 80}]
        }));

        let first: Vec<String> = MigrationPlan::from_snapshot(&data)
            .records("user-1")
            .into_iter()
            .map(|r| r.id)
            .collect();
        let second: Vec<String> = MigrationPlan::from_snapshot(&data)
            .records("user-1")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(first, second);

        let unique: std::collections::HashSet<&String> = first.iter().collect();
        assert_eq!(unique.len(), 4);

        let other_user = MigrationPlan::from_snapshot(&data).records("user-2");
        assert!(other_user.iter().all(|r| !first.contains(&r.id)));
    }

    #[test]
    fn record_ids_survive_new_items_ahead_of_old_ones() {
        let before = snapshot(json!({ "fitnessPlans": [{"title": "A"}] }));
        let after = snapshot(json!({ "fitnessPlans": [{"title": "B"}, {"title": "A"}] }));

        let old_id = MigrationPlan::from_snapshot(&before).records("user-1")[0].id.clone();
        let new_ids: Vec<String> = MigrationPlan::from_snapshot(&after)
            .records("user-1")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(new_ids[1], old_id);
        assert_ne!(new_ids[0], old_id);
    }

    #[test]
    fn record_tolerates_scalars_and_bad_dates() {
        let record = record_from_local(
            "user-1",
            LocalStorageKey::TherapistChats,
            &json!({"createdAt": "yesterday", "duration": -4}),
        );
        assert_eq!(record.duration_seconds, None);
        assert!(record.created_at <= Utc::now());

        let scalar = record_from_local("user-1", LocalStorageKey::FitnessPlans, &json!("plan text"));
        assert_eq!(scalar.kind, SessionKind::FitnessPlan);
        assert_eq!(scalar.analysis, json!("plan text"));
    }
}
