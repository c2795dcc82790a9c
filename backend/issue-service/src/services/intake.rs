//! Issue intake pipeline
//!
//! Orders the gates so the cheap checks run before anything that costs
//! money or time: reporter and location limits, then content validation,
//! then the photo upload, then both AI analyses in parallel. A relevance
//! rejection after upload cleans up the stored photo best-effort.

use std::sync::Arc;

use media_store::MediaStore;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::issue_repo::{self, NewIssue};
use crate::error::{AppError, Result};
use crate::models::{Issue, User};
use crate::services::abuse_guard::AbuseGuard;
use crate::services::content_validator::ContentValidator;
use crate::services::email_service::EmailService;
use crate::services::image_analyzer::{ImageAnalysis, ImageAnalyzer};
use crate::services::scoring;
use crate::services::text_analyzer::{AnalysisSource, TextAnalysis, TextAnalyzer};

/// A submission as parsed off the multipart request
#[derive(Debug)]
pub struct NewSubmission {
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub category: Option<String>,
    pub image_bytes: Vec<u8>,
}

/// What the AI concluded, echoed back to the reporter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    pub image_severity: i32,
    pub text_severity: i32,
    pub combined_severity: i32,
    pub category: String,
    pub confidence: f64,
    pub explanation: String,
    pub source: AnalysisSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeOutcome {
    pub issue: Issue,
    pub ai_analysis: AiSummary,
}

/// The intake pipeline with all its collaborators
pub struct IssueIntake {
    pub validator: ContentValidator,
    pub abuse_guard: AbuseGuard,
    pub text_analyzer: TextAnalyzer,
    pub image_analyzer: ImageAnalyzer,
    pub media_store: MediaStore,
    pub email_service: Arc<EmailService>,
    pub severity_text_weight: f64,
    pub severity_image_weight: f64,
}

impl IssueIntake {
    pub async fn submit(
        &self,
        pool: &PgPool,
        reporter: &User,
        submission: NewSubmission,
    ) -> Result<IntakeOutcome> {
        // Registration requires a city, but admin accounts can be seeded
        // without one and the column is nullable
        let city = reporter.city.as_deref().ok_or_else(|| {
            AppError::Validation(
                "Your account has no city assigned; issues cannot be reported without one"
                    .to_string(),
            )
        })?;

        if !(-90.0..=90.0).contains(&submission.lat)
            || !(-180.0..=180.0).contains(&submission.lng)
        {
            return Err(AppError::Validation("Invalid coordinates".to_string()));
        }

        self.abuse_guard.check_reporter(pool, reporter.id).await?;
        self.abuse_guard
            .check_location(pool, submission.lat, submission.lng)
            .await?;

        self.validator
            .validate(&submission.title, &submission.description)
            .map_err(AppError::Validation)?;

        if submission.image_bytes.is_empty() {
            return Err(AppError::Validation("Image is required".to_string()));
        }

        // Upload first: the vision model reads the photo by its stored URL
        let photo = self.media_store.store_photo(submission.image_bytes).await?;

        let analysis_text = format!("{}. {}", submission.title, submission.description);

        let (image_analysis, text_analysis) = tokio::join!(
            self.image_analyzer.analyze(&photo.url),
            self.text_analyzer
                .analyze(&analysis_text, submission.category.as_deref()),
        );

        let image_scores = match image_analysis {
            ImageAnalysis::Scored(scores) => scores,
            ImageAnalysis::NotRelevant { reason } => {
                self.discard_photo(&photo.key).await;
                return Err(AppError::Validation(reason));
            }
        };

        let text_scores = match text_analysis {
            TextAnalysis::Scored(scores) => scores,
            TextAnalysis::NotRelevant { reason } => {
                self.discard_photo(&photo.key).await;
                return Err(AppError::Validation(reason));
            }
        };

        let combined_severity = scoring::fuse_severity(
            text_scores.severity,
            image_scores.severity,
            self.severity_text_weight,
            self.severity_image_weight,
        );

        let unresolved = issue_repo::count_unresolved_issues(pool).await?;

        let priority = scoring::compute_priority(
            combined_severity,
            &submission.description,
            unresolved,
            text_scores.urgency_boost,
        );

        let issue = issue_repo::create_issue(
            pool,
            NewIssue {
                title: &submission.title,
                description: &submission.description,
                image_url: &photo.url,
                category: &text_scores.category,
                city,
                lat: submission.lat,
                lng: submission.lng,
                priority_score: priority.score,
                priority: priority.label.as_str(),
                breakdown: priority.breakdown,
                reported_by: reporter.id,
            },
        )
        .await?;

        info!(
            issue = %issue.id,
            score = priority.score,
            priority = priority.label.as_str(),
            "Issue created"
        );

        self.notify_reporter(reporter, &issue);

        Ok(IntakeOutcome {
            ai_analysis: AiSummary {
                image_severity: image_scores.severity,
                text_severity: text_scores.severity,
                combined_severity,
                category: text_scores.category,
                confidence: image_scores.confidence,
                explanation: text_scores.explanation,
                source: text_scores.source,
            },
            issue,
        })
    }

    /// Best-effort removal of a photo whose submission was rejected
    async fn discard_photo(&self, key: &str) {
        if let Err(err) = self.media_store.delete_photo(key).await {
            warn!(key = %key, error = %err, "Failed to delete rejected photo");
        }
    }

    /// Fire-and-forget confirmation email; failures are logged only
    fn notify_reporter(&self, reporter: &User, issue: &Issue) {
        let email_service = self.email_service.clone();
        let to_email = reporter.email.clone();
        let to_name = reporter.name.clone();
        let title = issue.title.clone();
        let priority = issue.priority.clone();
        let score = issue.priority_score;

        tokio::task::spawn_blocking(move || {
            if let Err(err) =
                email_service.send_issue_confirmation(&to_email, &to_name, &title, &priority, score)
            {
                warn!(error = %err, "Failed to send confirmation email");
            }
        });
    }
}
