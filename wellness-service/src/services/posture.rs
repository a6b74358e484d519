//! Heuristics over vision annotations, used to enrich the posture prompt and
//! to score the fallback report when the text model is unavailable.

use crate::services::providers::ImageAnnotations;

const SIDE_TILT_THRESHOLD: f32 = 10.0;
const PITCH_THRESHOLD: f32 = 15.0;
const PAN_THRESHOLD: f32 = 30.0;
const MIN_PERSON_CONFIDENCE: f32 = 0.5;
const BASE_SCORE: f64 = 85.0;

const SCENE_KEYWORDS: &[&str] = &[
    "sitting", "standing", "desk", "laptop", "computer", "chair", "sofa", "phone",
];

/// Plain-language notes about what the annotations suggest.
pub fn observations(annotations: &ImageAnnotations) -> Vec<String> {
    let mut notes = Vec::new();

    let person_seen = annotations
        .objects
        .iter()
        .any(|o| o.name.eq_ignore_ascii_case("person") && o.score >= MIN_PERSON_CONFIDENCE)
        || !annotations.faces.is_empty();

    if !person_seen {
        notes.push("No person clearly detected in the photo".to_string());
    }

    if let Some(face) = annotations.faces.first() {
        if face.roll_angle.abs() > SIDE_TILT_THRESHOLD {
            notes.push(format!(
                "Head tilted sideways by about {:.0}°",
                face.roll_angle.abs()
            ));
        }
        if face.tilt_angle < -PITCH_THRESHOLD {
            notes.push(format!(
                "Head angled downward by about {:.0}°, a sign of forward head posture",
                face.tilt_angle.abs()
            ));
        } else if face.tilt_angle > PITCH_THRESHOLD {
            notes.push(format!(
                "Head angled upward by about {:.0}°",
                face.tilt_angle
            ));
        }
        if face.pan_angle.abs() > PAN_THRESHOLD {
            notes.push("Face turned away from the camera; a side-on view limits analysis".to_string());
        }
    }

    let scene: Vec<String> = annotations
        .labels
        .iter()
        .map(|l| l.description.to_lowercase())
        .filter(|d| SCENE_KEYWORDS.iter().any(|k| d.contains(k)))
        .collect();
    if !scene.is_empty() {
        notes.push(format!("Scene suggests: {}", scene.join(", ")));
    }

    notes
}

/// Rough 0–100 score from head geometry. `None` without a detected face.
pub fn heuristic_score(annotations: &ImageAnnotations) -> Option<f64> {
    let face = annotations.faces.first()?;

    let roll_penalty = (face.roll_angle.abs() - SIDE_TILT_THRESHOLD).max(0.0) as f64;
    let pitch_penalty = (face.tilt_angle.abs() - PITCH_THRESHOLD).max(0.0) as f64 * 1.5;

    Some((BASE_SCORE - roll_penalty - pitch_penalty).clamp(0.0, 100.0).round())
}
