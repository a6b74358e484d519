//! Prompt construction for the AI proxy routes.

use crate::dtos::{FitnessPlanRequest, PostureAnalysisRequest};
use crate::services::providers::ImageAnnotations;
use std::fmt::Write;

pub const THERAPIST_SYSTEM_INSTRUCTION: &str = "You are a warm, supportive wellness companion. \
Listen carefully, reflect feelings back, and offer practical, evidence-informed coping ideas. \
Keep replies under 150 words. You are not a licensed therapist: never diagnose, and if the user \
mentions self-harm or crisis, urge them to contact local emergency services or a crisis line.";

pub const COACH_SYSTEM_INSTRUCTION: &str = "You are a certified personal trainer and posture coach. \
Answer only with valid JSON matching the requested shape, without markdown fences or commentary.";

const FITNESS_PLAN_SHAPE: &str = r#"{
  "title": string,
  "summary": string,
  "weekly_schedule": [
    {
      "day": string,
      "focus": string,
      "exercises": [
        { "name": string, "sets": number, "reps": string, "duration_minutes": number, "notes": string }
      ]
    }
  ],
  "tips": [string]
}"#;

const POSTURE_REPORT_SHAPE: &str = r#"{
  "score": number between 0 and 100,
  "summary": string,
  "issues": [string],
  "recommendations": [string]
}"#;

pub fn fitness_plan_prompt(request: &FitnessPlanRequest) -> String {
    let mut prompt = String::from("Create a one-week personalised fitness plan.\n\n");

    let _ = writeln!(prompt, "Fitness level: {}", request.fitness_level.trim());
    let _ = writeln!(prompt, "Goals: {}", join_or(&request.goals, "general fitness"));
    if let Some(age) = request.age {
        let _ = writeln!(prompt, "Age: {}", age);
    }
    if let Some(minutes) = request.available_minutes {
        let _ = writeln!(prompt, "Time available per session: {} minutes", minutes);
    }
    let _ = writeln!(
        prompt,
        "Equipment: {}",
        join_or(&request.equipment, "none (bodyweight only)")
    );
    if let Some(limitations) = request.limitations.as_deref().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(
            prompt,
            "Injuries or limitations to respect: {}",
            limitations.trim()
        );
    }

    let _ = write!(
        prompt,
        "\nInclude rest days. Respond with JSON of this shape:\n{}",
        FITNESS_PLAN_SHAPE
    );
    prompt
}

pub fn posture_prompt(
    annotations: &ImageAnnotations,
    observations: &[String],
    request: &PostureAnalysisRequest,
) -> String {
    let mut prompt = String::from(
        "Assess the posture of the person in a photo. You cannot see the photo; \
         use these machine-vision annotations instead.\n\n",
    );

    if !annotations.labels.is_empty() {
        let labels: Vec<String> = annotations
            .labels
            .iter()
            .map(|l| format!("{} ({:.0}%)", l.description, l.score * 100.0))
            .collect();
        let _ = writeln!(prompt, "Scene labels: {}", labels.join(", "));
    }

    for object in &annotations.objects {
        let _ = writeln!(
            prompt,
            "Object: {} ({:.0}%), box {}",
            object.name,
            object.score * 100.0,
            object
                .vertices
                .iter()
                .map(|v| format!("({:.2},{:.2})", v.x, v.y))
                .collect::<Vec<_>>()
                .join(" ")
        );
    }

    for face in &annotations.faces {
        let _ = writeln!(
            prompt,
            "Head orientation: roll {:.1}°, pan {:.1}°, tilt {:.1}°",
            face.roll_angle, face.pan_angle, face.tilt_angle
        );
    }

    if !observations.is_empty() {
        let _ = writeln!(prompt, "Observations: {}", observations.join("; "));
    }

    if let Some(notes) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(prompt, "User notes: {}", notes.trim());
    }

    let _ = write!(
        prompt,
        "\nRespond with JSON of this shape:\n{}",
        POSTURE_REPORT_SHAPE
    );
    prompt
}

fn join_or(items: &[String], empty: &str) -> String {
    let cleaned: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        empty.to_string()
    } else {
        cleaned.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{FaceGeometry, Label};

    fn plan_request() -> FitnessPlanRequest {
        FitnessPlanRequest {
            fitness_level: "beginner".to_string(),
            goals: vec!["lose weight".to_string(), " ".to_string()],
            age: Some(34),
            available_minutes: Some(30),
            equipment: vec![],
            limitations: Some("bad knee".to_string()),
        }
    }

    #[test]
    fn fitness_prompt_mentions_every_preference() {
        let prompt = fitness_plan_prompt(&plan_request());
        assert!(prompt.contains("Fitness level: beginner"));
        assert!(prompt.contains("Goals: lose weight\n"));
        assert!(prompt.contains("Age: 34"));
        assert!(prompt.contains("30 minutes"));
        assert!(prompt.contains("bodyweight only"));
        assert!(prompt.contains("bad knee"));
        assert!(prompt.contains("weekly_schedule"));
    }

    #[test]
    fn posture_prompt_lists_annotations() {
        let annotations = ImageAnnotations {
            labels: vec![Label {
                description: "Sitting".to_string(),
                score: 0.9,
            }],
            objects: vec![],
            faces: vec![FaceGeometry {
                roll_angle: 12.0,
                pan_angle: 0.0,
                tilt_angle: -20.0,
                detection_confidence: 0.9,
            }],
        };
        let request = PostureAnalysisRequest {
            image: "x".to_string(),
            notes: Some("desk job".to_string()),
        };
        let prompt = posture_prompt(&annotations, &["Head tilted".to_string()], &request);

        assert!(prompt.contains("Sitting (90%)"));
        assert!(prompt.contains("tilt -20.0°"));
        assert!(prompt.contains("Observations: Head tilted"));
        assert!(prompt.contains("User notes: desk job"));
    }
}
