use crate::services::providers::ChatTurn;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// At least one goal must carry text.
fn has_goal(goals: &[String]) -> Result<(), ValidationError> {
    if goals.iter().all(|g| g.trim().is_empty()) {
        return Err(ValidationError::new("no_goal"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FitnessPlanRequest {
    /// e.g. "beginner", "intermediate", "advanced"
    #[serde(default)]
    #[validate(
        length(min = 1, max = 50, message = "fitness_level is required"),
        custom(function = "not_blank", message = "fitness_level is required")
    )]
    pub fitness_level: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 10, message = "at least one goal is required"),
        custom(function = "has_goal", message = "at least one goal is required")
    )]
    pub goals: Vec<String>,

    #[validate(range(min = 13, max = 100))]
    pub age: Option<u32>,

    /// Minutes available per session.
    #[validate(range(min = 5, max = 240))]
    pub available_minutes: Option<u32>,

    #[serde(default)]
    pub equipment: Vec<String>,

    #[validate(length(max = 1000))]
    pub limitations: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TherapistChatRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 4000, message = "message is required"),
        custom(function = "not_blank", message = "message is required")
    )]
    pub message: String,

    /// Earlier turns, oldest first.
    #[serde(default)]
    #[validate(length(max = 50))]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostureAnalysisRequest {
    /// Base64 image, optionally as a `data:image/...;base64,` URL.
    #[serde(default)]
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Posture report shape shared by the model output and the canned fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostureReport {
    pub score: f64,
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Heuristic notes derived from the image annotations.
    #[serde(default)]
    pub observations: Vec<String>,
}
