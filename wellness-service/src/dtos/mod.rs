pub mod ai;
pub mod migration;
pub mod sessions;

pub use ai::{ChatReply, FitnessPlanRequest, PostureAnalysisRequest, PostureReport, TherapistChatRequest};
pub use migration::{MigrationPreview, MigrationRequest, MigrationSummary};
pub use sessions::{CreateSessionRequest, SessionListParams, SessionResponse};

use serde::Serialize;

/// Success half of the `{ success, data | error }` envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    /// Set on proxy routes: `true` when `data` is the canned payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            fallback: None,
            pagination: None,
        }
    }

    pub fn proxied(data: T, fallback: bool) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::ok(data)
        }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(data)
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}
