//! Google Cloud Vision `images:annotate` provider.

use super::{
    google_headers, network_error, FaceGeometry, ImageAnnotations, Label, LocalizedObject,
    ProviderError, Vertex, VisionProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MAX_LABELS: u32 = 10;
const MAX_OBJECTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    /// e.g. `https://vision.googleapis.com/v1`
    pub api_base: String,
}

pub struct CloudVisionProvider {
    config: VisionConfig,
    client: Client,
}

impl CloudVisionProvider {
    pub fn new(config: VisionConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn api_url(&self) -> String {
        format!("{}/images:annotate", self.config.api_base.trim_end_matches('/'))
    }
}

fn annotate_request(image_base64: &str) -> AnnotateRequest {
    AnnotateRequest {
        requests: vec![ImageRequest {
            image: ImageContent {
                content: image_base64.to_string(),
            },
            features: vec![
                Feature {
                    kind: "LABEL_DETECTION",
                    max_results: MAX_LABELS,
                },
                Feature {
                    kind: "OBJECT_LOCALIZATION",
                    max_results: MAX_OBJECTS,
                },
                Feature {
                    kind: "FACE_DETECTION",
                    max_results: 1,
                },
            ],
        }],
    }
}

fn into_annotations(response: AnnotateResponse) -> Result<ImageAnnotations, ProviderError> {
    let first = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ApiError("Empty annotate response".to_string()))?;

    if let Some(err) = first.error {
        return Err(ProviderError::ApiError(format!(
            "Vision API error {}: {}",
            err.code, err.message
        )));
    }

    Ok(ImageAnnotations {
        labels: first
            .label_annotations
            .into_iter()
            .map(|l| Label {
                description: l.description,
                score: l.score,
            })
            .collect(),
        objects: first
            .localized_object_annotations
            .into_iter()
            .map(|o| LocalizedObject {
                name: o.name,
                score: o.score,
                vertices: o
                    .bounding_poly
                    .map(|p| {
                        p.normalized_vertices
                            .into_iter()
                            .map(|v| Vertex { x: v.x, y: v.y })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect(),
        faces: first
            .face_annotations
            .into_iter()
            .map(|f| FaceGeometry {
                roll_angle: f.roll_angle,
                pan_angle: f.pan_angle,
                tilt_angle: f.tilt_angle,
                detection_confidence: f.detection_confidence,
            })
            .collect(),
    })
}

#[async_trait]
impl VisionProvider for CloudVisionProvider {
    async fn annotate(&self, image_base64: &str) -> Result<ImageAnnotations, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Vision API key not configured".to_string(),
            ));
        }

        tracing::debug!(image_len = image_base64.len(), "Sending request to Vision API");

        let response = self
            .client
            .post(self.api_url())
            .headers(google_headers(&self.config.api_key)?)
            .json(&annotate_request(image_base64))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Vision API error {}: {}",
                status, error_text
            )));
        }

        let body: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::ApiError(format!("Failed to parse response: {}", e.without_url()))
            })?;

        into_annotations(body)
    }
}

// ============================================================================
// Vision API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    localized_object_annotations: Vec<ObjectAnnotation>,
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectAnnotation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingPoly {
    #[serde(default)]
    normalized_vertices: Vec<NormalizedVertex>,
}

// The API omits zero coordinates.
#[derive(Debug, Deserialize)]
struct NormalizedVertex {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    #[serde(default)]
    roll_angle: f32,
    #[serde(default)]
    pan_angle: f32,
    #[serde(default)]
    tilt_angle: f32,
    #[serde(default)]
    detection_confidence: f32,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}
