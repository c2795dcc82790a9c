//! Text analysis of issue reports
//!
//! Primary path asks the Groq text model for severity, urgency boost,
//! category and relevance. Any transport, parse or shape failure drops to
//! the rule-based fallback, so a submission can always be scored. Only an
//! explicit relevance rejection from the model blocks a submission.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::{extract_json_payload, CompletionApi};

const TEXT_SYSTEM_PROMPT: &str = "You are an AI assistant that analyzes civic infrastructure issues. Always respond with valid JSON only.";

const HIGH_SEVERITY_KEYWORDS: &[&str] = &[
    "broken", "damaged", "dangerous", "hazard", "emergency", "urgent", "critical", "severe",
];

const MEDIUM_SEVERITY_KEYWORDS: &[&str] =
    &["leaking", "cracked", "blocked", "stuck", "malfunctioning"];

const HIGH_IMPACT_LOCATIONS: &[&str] =
    &["hospital", "school", "station", "main road", "highway", "market"];

const SAFETY_KEYWORDS: &[&str] = &["unsafe", "danger", "risk", "accident", "injury"];

/// Which engine produced the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Groq,
    Fallback,
}

/// Outcome of analyzing the report text
#[derive(Debug, Clone)]
pub enum TextAnalysis {
    /// The text describes a civic issue and was scored
    Scored(TextScores),

    /// The model judged the text unrelated to civic infrastructure
    NotRelevant { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextScores {
    pub severity: i32,
    pub urgency_boost: i32,
    pub category: String,
    pub explanation: String,
    pub source: AnalysisSource,
}

/// Text analyzer with AI primary path and rule-based fallback
pub struct TextAnalyzer {
    api: Option<Arc<dyn CompletionApi>>,
}

impl TextAnalyzer {
    pub fn new(api: Option<Arc<dyn CompletionApi>>) -> Self {
        Self { api }
    }

    /// Analyze the report text, preferring the AI path when configured.
    ///
    /// A user-selected category always wins over the model's guess.
    pub async fn analyze(&self, text: &str, user_category: Option<&str>) -> TextAnalysis {
        let Some(api) = &self.api else {
            warn!("Groq not configured, using rule-based text analysis");
            return TextAnalysis::Scored(fallback_analysis(text, user_category));
        };

        let prompt = build_text_prompt(text, user_category);

        match api.complete(TEXT_SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => match parse_text_reply(&reply, user_category) {
                Ok(analysis) => {
                    if let TextAnalysis::Scored(scores) = &analysis {
                        info!(
                            severity = scores.severity,
                            boost = scores.urgency_boost,
                            category = %scores.category,
                            "Text analysis complete"
                        );
                    }
                    analysis
                }
                Err(err) => {
                    warn!(error = %err, "Unusable text analysis reply, using fallback");
                    TextAnalysis::Scored(fallback_analysis(text, user_category))
                }
            },
            Err(err) => {
                warn!(error = %err, "Groq text analysis failed, using fallback");
                TextAnalysis::Scored(fallback_analysis(text, user_category))
            }
        }
    }
}

fn build_text_prompt(text: &str, user_category: Option<&str>) -> String {
    let category_hint = user_category
        .map(|c| format!("User selected category: {}", c))
        .unwrap_or_default();

    format!(
        r#"Analyze this civic issue report and provide a JSON response with the following fields:
- severity: number from 1-10 (1=minor, 10=critical) based on description urgency
- urgencyBoost: number from 0-15 (additional priority points)
- category: one of ["Road", "Water", "Electricity", "Waste", "Other"]
- explanation: brief reason for the severity rating
- isRelevant: boolean (true if this describes a civic infrastructure issue; false if it's random/irrelevant text)

Civic issues include: potholes, broken roads, water leaks, garbage, streetlights, drainage, public property damage, etc.
NOT civic issues: random text, jokes, personal messages, unrelated content, gibberish, etc.

Issue: "{text}"
{category_hint}

Respond ONLY with valid JSON, no other text."#
    )
}

/// Parse a model reply into an analysis; kept separate from the network call
/// so the shapes can be tested against fixed strings.
fn parse_text_reply(reply: &str, user_category: Option<&str>) -> Result<TextAnalysis, String> {
    let value = extract_json_payload(reply).map_err(|e| e.to_string())?;

    if value["isRelevant"] == serde_json::Value::Bool(false) {
        return Ok(TextAnalysis::NotRelevant {
            reason: "The description does not appear to be related to civic infrastructure issues. Please describe problems with roads, water supply, electricity, waste management, or other public infrastructure.".to_string(),
        });
    }

    let severity = value["severity"].as_i64().unwrap_or(5).clamp(1, 10) as i32;
    let urgency_boost = value["urgencyBoost"].as_i64().unwrap_or(0).clamp(0, 15) as i32;

    let category = user_category
        .map(str::to_string)
        .or_else(|| value["category"].as_str().map(str::to_string))
        .unwrap_or_else(|| "Other".to_string());

    let explanation = value["explanation"]
        .as_str()
        .unwrap_or("AI-based priority scoring")
        .to_string();

    Ok(TextAnalysis::Scored(TextScores {
        severity,
        urgency_boost,
        category,
        explanation,
        source: AnalysisSource::Groq,
    }))
}

/// Rule-based analysis used when the AI path is unavailable
fn fallback_analysis(text: &str, user_category: Option<&str>) -> TextScores {
    let lower = text.to_lowercase();

    let category = user_category
        .map(str::to_string)
        .unwrap_or_else(|| detect_category(&lower));

    let mut severity: i32 = 5;
    let mut urgency_boost: i32 = 0;
    let mut explanation = "Standard priority";

    let high_count = HIGH_SEVERITY_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count() as i32;
    let medium_count = MEDIUM_SEVERITY_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count() as i32;

    if high_count > 0 {
        severity = 8 + high_count.min(2);
        explanation = "High severity issue";
    } else if medium_count > 0 {
        severity = 6 + medium_count.min(2);
        explanation = "Moderate severity issue";
    }

    for location in HIGH_IMPACT_LOCATIONS {
        if lower.contains(location) {
            urgency_boost += 10;
        }
    }

    for keyword in SAFETY_KEYWORDS {
        if lower.contains(keyword) {
            urgency_boost += 5;
            severity = (severity + 1).min(10);
        }
    }

    TextScores {
        severity: severity.clamp(1, 10),
        urgency_boost: urgency_boost.clamp(0, 15),
        category,
        explanation: explanation.to_string(),
        source: AnalysisSource::Fallback,
    }
}

fn detect_category(lower: &str) -> String {
    let category = if lower.contains("garbage") || lower.contains("trash") || lower.contains("waste")
    {
        "Waste"
    } else if lower.contains("road") || lower.contains("pothole") || lower.contains("street") {
        "Road"
    } else if lower.contains("water") || lower.contains("pipe") || lower.contains("leak") {
        "Water"
    } else if lower.contains("light") || lower.contains("electricity") || lower.contains("power") {
        "Electricity"
    } else {
        "Other"
    };

    category.to_string()
}
