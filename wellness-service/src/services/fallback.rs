//! Canned payloads returned when an upstream AI call fails.

use crate::dtos::{ChatReply, FitnessPlanRequest, PostureReport};
use serde_json::{json, Value};

pub const DEFAULT_POSTURE_SCORE: f64 = 70.0;

pub const THERAPIST_FALLBACK_REPLY: &str = "Thank you for sharing that with me. I'm having trouble \
connecting right now, but what you're feeling matters. Try a slow breath: in for four counts, hold \
for four, out for six. If you are in crisis, please contact your local emergency number or a crisis \
line right away.";

/// Demo plan shaped like the model output, lightly personalised.
pub fn demo_fitness_plan(request: &FitnessPlanRequest) -> Value {
    let minutes = request.available_minutes.unwrap_or(30);
    let goal = request
        .goals
        .iter()
        .map(|g| g.trim())
        .find(|g| !g.is_empty())
        .unwrap_or("general fitness");

    json!({
        "title": format!("{} starter plan", capitalise(request.fitness_level.trim())),
        "summary": format!(
            "A balanced week of {}-minute sessions focused on {}.",
            minutes, goal
        ),
        "weekly_schedule": [
            {
                "day": "Monday",
                "focus": "Full-body strength",
                "exercises": [
                    { "name": "Bodyweight squats", "sets": 3, "reps": "12", "duration_minutes": 8, "notes": "Keep knees tracking over toes" },
                    { "name": "Incline push-ups", "sets": 3, "reps": "10", "duration_minutes": 8, "notes": "Hands on a bench or wall" },
                    { "name": "Glute bridges", "sets": 3, "reps": "15", "duration_minutes": 6, "notes": "Squeeze at the top" }
                ]
            },
            {
                "day": "Tuesday",
                "focus": "Low-intensity cardio",
                "exercises": [
                    { "name": "Brisk walk", "sets": 1, "reps": "continuous", "duration_minutes": minutes, "notes": "Conversational pace" }
                ]
            },
            { "day": "Wednesday", "focus": "Rest and mobility", "exercises": [
                { "name": "Cat-cow stretch", "sets": 2, "reps": "10", "duration_minutes": 5, "notes": "Move with your breath" }
            ] },
            {
                "day": "Thursday",
                "focus": "Core and posture",
                "exercises": [
                    { "name": "Plank", "sets": 3, "reps": "30s", "duration_minutes": 5, "notes": "Neutral spine" },
                    { "name": "Bird dog", "sets": 3, "reps": "10 per side", "duration_minutes": 6, "notes": "Slow and controlled" },
                    { "name": "Wall angels", "sets": 2, "reps": "12", "duration_minutes": 4, "notes": "Keep your back flat on the wall" }
                ]
            },
            {
                "day": "Friday",
                "focus": "Intervals",
                "exercises": [
                    { "name": "March or jog intervals", "sets": 6, "reps": "1 min on / 1 min easy", "duration_minutes": 12, "notes": "Adjust intensity to feel" }
                ]
            },
            { "day": "Saturday", "focus": "Active recovery", "exercises": [
                { "name": "Yoga flow", "sets": 1, "reps": "continuous", "duration_minutes": 20, "notes": "Gentle stretching" }
            ] },
            { "day": "Sunday", "focus": "Rest", "exercises": [] }
        ],
        "tips": [
            "Warm up for five minutes before each session.",
            "Stay hydrated and prioritise sleep.",
            "Stop any exercise that causes sharp pain."
        ]
    })
}

pub fn therapist_reply() -> ChatReply {
    ChatReply {
        reply: THERAPIST_FALLBACK_REPLY.to_string(),
    }
}

/// Generic posture report; keeps any heuristic score and observations we have.
pub fn posture_report(score: Option<f64>, observations: Vec<String>) -> PostureReport {
    PostureReport {
        score: score.unwrap_or(DEFAULT_POSTURE_SCORE),
        summary: "We couldn't complete a detailed analysis right now. Here are general posture \
                  guidelines in the meantime."
            .to_string(),
        issues: vec![
            "Prolonged sitting tends to round the shoulders forward".to_string(),
            "Screens below eye level encourage forward head posture".to_string(),
        ],
        recommendations: vec![
            "Raise your screen so the top is at eye level".to_string(),
            "Keep feet flat with knees at roughly 90 degrees".to_string(),
            "Stand up and stretch every 30 to 45 minutes".to_string(),
            "Do chin tucks and wall angels daily".to_string(),
        ],
        observations,
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Personal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_plan_is_personalised() {
        let request = FitnessPlanRequest {
            fitness_level: "beginner".to_string(),
            goals: vec!["build strength".to_string()],
            age: None,
            available_minutes: Some(25),
            equipment: vec![],
            limitations: None,
        };
        let plan = demo_fitness_plan(&request);
        assert_eq!(plan["title"], "Beginner starter plan");
        assert!(plan["summary"].as_str().unwrap().contains("25-minute"));
        assert!(plan["summary"].as_str().unwrap().contains("build strength"));
        assert_eq!(plan["weekly_schedule"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn posture_fallback_defaults_score() {
        let report = posture_report(None, vec![]);
        assert_eq!(report.score, DEFAULT_POSTURE_SCORE);
        assert!(!report.recommendations.is_empty());
    }
}
