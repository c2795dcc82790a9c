//! Vision analysis of the uploaded issue photo
//!
//! Asks the Groq vision model whether the photo shows civic infrastructure
//! and how severe the damage looks. Failures of any kind (no key, transport,
//! bad JSON) resolve to a neutral assessment so the pipeline can continue on
//! text evidence alone; only an explicit relevance rejection blocks the
//! submission.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{extract_json_payload, CompletionApi};

const VISION_PROMPT: &str = r#"Analyze this civic infrastructure issue image and provide a JSON response with:
- severity: number from 1-10 (1=minor cosmetic issue, 10=critical safety hazard)
- confidence: number from 0-1 (how confident you are in the assessment)
- detectedObjects: array of 1-3 main objects/issues visible
- description: brief description of what you see
- isRelevant: boolean (true if this is a civic infrastructure issue like roads, water, electricity, waste, public facilities; false if it's random/unrelated content)

Civic issues include: potholes, broken roads, water leaks, garbage, streetlights, drainage, public property damage, etc.
NOT civic issues: personal photos, memes, random objects, food, animals, selfies, etc.

Respond ONLY with valid JSON, no other text."#;

/// Outcome of analyzing the photo
#[derive(Debug, Clone)]
pub enum ImageAnalysis {
    /// The photo shows a civic issue (or we could not tell and assumed so)
    Scored(ImageScores),

    /// The model judged the photo unrelated to civic infrastructure
    NotRelevant { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageScores {
    pub severity: i32,
    pub confidence: f64,
    pub detected_objects: Vec<String>,
    pub description: Option<String>,
}

impl ImageScores {
    /// Neutral assessment used whenever vision analysis is unavailable
    fn neutral() -> Self {
        Self {
            severity: 5,
            confidence: 0.5,
            detected_objects: vec!["unknown".to_string()],
            description: None,
        }
    }
}

/// Vision analyzer over the stored photo URL
pub struct ImageAnalyzer {
    api: Option<Arc<dyn CompletionApi>>,
}

impl ImageAnalyzer {
    pub fn new(api: Option<Arc<dyn CompletionApi>>) -> Self {
        Self { api }
    }

    pub async fn analyze(&self, image_url: &str) -> ImageAnalysis {
        let Some(api) = &self.api else {
            warn!("Groq not configured, using neutral image assessment");
            return ImageAnalysis::Scored(ImageScores::neutral());
        };

        match api.complete_with_image(VISION_PROMPT, image_url).await {
            Ok(reply) => match parse_image_reply(&reply) {
                Ok(analysis) => {
                    if let ImageAnalysis::Scored(scores) = &analysis {
                        info!(
                            severity = scores.severity,
                            confidence = scores.confidence,
                            "Image analysis complete"
                        );
                    }
                    analysis
                }
                Err(err) => {
                    warn!(error = %err, "Unusable image analysis reply, using neutral assessment");
                    ImageAnalysis::Scored(ImageScores::neutral())
                }
            },
            Err(err) => {
                warn!(error = %err, "Groq vision analysis failed, using neutral assessment");
                ImageAnalysis::Scored(ImageScores::neutral())
            }
        }
    }
}

fn parse_image_reply(reply: &str) -> Result<ImageAnalysis, String> {
    let value = extract_json_payload(reply).map_err(|e| e.to_string())?;

    if value["isRelevant"] == serde_json::Value::Bool(false) {
        return Ok(ImageAnalysis::NotRelevant {
            reason: "The uploaded image does not appear to be related to civic infrastructure issues. Please upload an image of roads, water supply, electricity, waste management, or other public infrastructure problems.".to_string(),
        });
    }

    let severity = value["severity"].as_i64().unwrap_or(5).clamp(1, 10) as i32;
    let confidence = value["confidence"].as_f64().unwrap_or(0.7).clamp(0.0, 1.0);

    let detected_objects = value["detectedObjects"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .filter(|objects| !objects.is_empty())
        .unwrap_or_else(|| vec!["infrastructure issue".to_string()]);

    let description = value["description"].as_str().map(str::to_string);

    Ok(ImageAnalysis::Scored(ImageScores {
        severity,
        confidence,
        detected_objects,
        description,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scored_reply() {
        let reply = r#"```json
{"isRelevant": true, "severity": 7, "confidence": 0.9, "detectedObjects": ["pothole", "cracked asphalt"], "description": "deep pothole"}
```"#;
        match parse_image_reply(reply).unwrap() {
            ImageAnalysis::Scored(scores) => {
                assert_eq!(scores.severity, 7);
                assert!((scores.confidence - 0.9).abs() < f64::EPSILON);
                assert_eq!(scores.detected_objects, vec!["pothole", "cracked asphalt"]);
            }
            other => panic!("expected scored analysis, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_relevant_reply() {
        match parse_image_reply(r#"{"isRelevant": false}"#).unwrap() {
            ImageAnalysis::NotRelevant { reason } => {
                assert!(reason.contains("uploaded image"))
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_clamps_and_defaults() {
        let reply = r#"{"severity": 99, "confidence": 3.0, "detectedObjects": []}"#;
        match parse_image_reply(reply).unwrap() {
            ImageAnalysis::Scored(scores) => {
                assert_eq!(scores.severity, 10);
                assert!((scores.confidence - 1.0).abs() < f64::EPSILON);
                assert_eq!(scores.detected_objects, vec!["infrastructure issue"]);
            }
            other => panic!("expected scored analysis, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_image_reply("not json").is_err());
    }

    #[tokio::test]
    async fn test_analyze_without_api_is_neutral() {
        let analyzer = ImageAnalyzer::new(None);
        match analyzer.analyze("https://example.com/a.png").await {
            ImageAnalysis::Scored(scores) => {
                assert_eq!(scores.severity, 5);
                assert!((scores.confidence - 0.5).abs() < f64::EPSILON);
                assert_eq!(scores.detected_objects, vec!["unknown"]);
            }
            other => panic!("expected neutral assessment, got {:?}", other),
        }
    }
}
