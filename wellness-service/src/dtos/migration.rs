use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Snapshot of the browser's local storage, keyed by storage key.
#[derive(Debug, Deserialize, Default, Validate)]
pub struct MigrationRequest {
    #[serde(default)]
    pub local_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MigrationPreview {
    /// Known keys holding non-empty arrays, with their lengths.
    pub pending: BTreeMap<String, usize>,
    pub total: usize,
    pub ignored_keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MigrationSummary {
    pub migrated: BTreeMap<String, usize>,
    pub total: usize,
    /// Keys the client should now clear from local storage.
    pub clear_keys: Vec<String>,
    pub ignored_keys: Vec<String>,
}
