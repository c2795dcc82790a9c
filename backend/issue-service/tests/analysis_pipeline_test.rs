//! End-to-end tests of the analysis and scoring pipeline against a
//! scripted chat-completion client, no network or database required.

use std::sync::Arc;

use async_trait::async_trait;

use issue_service::ai::client::AiError;
use issue_service::ai::CompletionApi;
use issue_service::models::PriorityLabel;
use issue_service::services::image_analyzer::{ImageAnalysis, ImageAnalyzer};
use issue_service::services::scoring;
use issue_service::services::text_analyzer::{AnalysisSource, TextAnalysis, TextAnalyzer};

/// Chat client that replays canned replies
struct ScriptedApi {
    text_reply: Result<String, ()>,
    image_reply: Result<String, ()>,
}

impl ScriptedApi {
    fn new(text_reply: Result<&str, ()>, image_reply: Result<&str, ()>) -> Arc<Self> {
        Arc::new(Self {
            text_reply: text_reply.map(str::to_string),
            image_reply: image_reply.map(str::to_string),
        })
    }
}

#[async_trait]
impl CompletionApi for ScriptedApi {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AiError> {
        self.text_reply
            .clone()
            .map_err(|_| AiError::Transport("scripted failure".to_string()))
    }

    async fn complete_with_image(
        &self,
        _prompt: &str,
        _image_url: &str,
    ) -> Result<String, AiError> {
        self.image_reply
            .clone()
            .map_err(|_| AiError::Transport("scripted failure".to_string()))
    }
}

#[tokio::test]
async fn scored_submission_flows_through_to_priority() {
    let api = ScriptedApi::new(
        Ok(r#"{"isRelevant": true, "severity": 9, "urgencyBoost": 10, "category": "Road", "explanation": "deep pothole on a busy road"}"#),
        Ok(r#"{"isRelevant": true, "severity": 7, "confidence": 0.85, "detectedObjects": ["pothole"]}"#),
    );

    let text_analyzer = TextAnalyzer::new(Some(api.clone()));
    let image_analyzer = ImageAnalyzer::new(Some(api));

    let (text, image) = tokio::join!(
        text_analyzer.analyze("Huge pothole. Cars swerving near the school gate", None),
        image_analyzer.analyze("https://cdn.example.com/photos/a.png"),
    );

    let TextAnalysis::Scored(text) = text else {
        panic!("text analysis should score");
    };
    let ImageAnalysis::Scored(image) = image else {
        panic!("image analysis should score");
    };

    assert_eq!(text.source, AnalysisSource::Groq);
    assert_eq!(text.category, "Road");

    // round(9 * 0.8 + 7 * 0.2) = 9
    let fused = scoring::fuse_severity(text.severity, image.severity, 0.8, 0.2);
    assert_eq!(fused, 9);

    // severity 90, school -> 90, 0 unresolved -> 20, time 10
    // base = round(45 + 27 + 2 + 1) = 75, +10 boost = 85
    let priority = scoring::compute_priority(
        fused,
        "Cars swerving near the school gate",
        0,
        text.urgency_boost,
    );
    assert_eq!(priority.score, 85);
    assert_eq!(priority.label, PriorityLabel::High);
}

#[tokio::test]
async fn irrelevant_image_blocks_the_submission() {
    let api = ScriptedApi::new(
        Ok(r#"{"isRelevant": true, "severity": 5}"#),
        Ok(r#"{"isRelevant": false}"#),
    );

    let analyzer = ImageAnalyzer::new(Some(api));
    match analyzer.analyze("https://cdn.example.com/photos/cat.png").await {
        ImageAnalysis::NotRelevant { reason } => {
            assert!(reason.contains("civic infrastructure"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn transport_failure_degrades_to_fallback_rules() {
    let api = ScriptedApi::new(Err(()), Err(()));

    let text_analyzer = TextAnalyzer::new(Some(api.clone()));
    let image_analyzer = ImageAnalyzer::new(Some(api));

    let text = text_analyzer
        .analyze("Broken water pipe flooding the main road", None)
        .await;
    let TextAnalysis::Scored(text) = text else {
        panic!("fallback should still score");
    };
    assert_eq!(text.source, AnalysisSource::Fallback);
    // "broken" from the high list, no safety words
    assert_eq!(text.severity, 9);
    // "main road" location boost
    assert_eq!(text.urgency_boost, 10);

    match image_analyzer.analyze("https://cdn.example.com/photos/a.png").await {
        ImageAnalysis::Scored(image) => {
            assert_eq!(image.severity, 5);
            assert_eq!(image.detected_objects, vec!["unknown"]);
        }
        other => panic!("expected neutral assessment, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_reply_degrades_to_fallback_rules() {
    let api = ScriptedApi::new(Ok("Sure, here is my analysis!"), Ok("```json\nnot json\n```"));

    let text_analyzer = TextAnalyzer::new(Some(api.clone()));
    let text = text_analyzer.analyze("Overflowing garbage bins", None).await;

    let TextAnalysis::Scored(text) = text else {
        panic!("fallback should still score");
    };
    assert_eq!(text.source, AnalysisSource::Fallback);
    assert_eq!(text.category, "Waste");
}
