//! Issue endpoints: intake, listing, status changes, fake-report review
//! and aggregate stats

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt as _;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{issue_repo, user_repo};
use crate::error::{AppError, Result};
use crate::handlers::city_scope;
use crate::middleware::UserId;
use crate::models::{IssueCategory, IssueStatus, User};
use crate::services::abuse_guard::{self, PenaltyOutcome};
use crate::services::intake::{IssueIntake, NewSubmission};

async fn load_user(pool: &PgPool, user_id: UserId) -> Result<User> {
    user_repo::find_user_by_id(pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
}

fn require_admin(user: &User) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only admins can perform this action".to_string(),
        ))
    }
}

/// POST /api/v1/issues (multipart)
pub async fn create_issue(
    user_id: UserId,
    pool: web::Data<PgPool>,
    intake: web::Data<IssueIntake>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let reporter = load_user(&pool, user_id).await?;
    let submission = parse_submission(payload).await?;

    let outcome = intake.submit(&pool, &reporter, submission).await?;

    Ok(HttpResponse::Created().json(json!({
        "data": outcome,
        "message": "Issue created successfully with AI analysis",
    })))
}

/// GET /api/v1/issues
pub async fn get_all_issues(user_id: UserId, pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let user = load_user(&pool, user_id).await?;
    let issues = issue_repo::list_issues(&pool, city_scope(&user)).await?;

    Ok(HttpResponse::Ok().json(issues))
}

/// GET /api/v1/issues/priority (admin triage queue)
pub async fn get_priority_issues(
    user_id: UserId,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse> {
    let user = load_user(&pool, user_id).await?;
    require_admin(&user)?;

    let issues = issue_repo::list_unresolved_issues(&pool, city_scope(&user)).await?;

    Ok(HttpResponse::Ok().json(issues))
}

/// GET /api/v1/issues/{issue_id}
pub async fn get_issue_by_id(
    user_id: UserId,
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = load_user(&pool, user_id).await?;
    let issue = issue_repo::find_issue_by_id(&pool, path.into_inner(), city_scope(&user))
        .await?
        .ok_or_else(|| AppError::NotFound("Issue not found".to_string()))?;

    Ok(HttpResponse::Ok().json(issue))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/v1/issues/{issue_id}/status
pub async fn update_issue_status(
    user_id: UserId,
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse> {
    let user = load_user(&pool, user_id).await?;
    require_admin(&user)?;

    let status = IssueStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation("Invalid status value".to_string()))?;

    let issue = issue_repo::update_issue_status(
        &pool,
        path.into_inner(),
        status.as_str(),
        city_scope(&user),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Issue not found or not in your city".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "data": issue,
        "message": "Issue status updated",
    })))
}

/// PUT /api/v1/issues/{issue_id}/fake
pub async fn report_issue_fake(
    user_id: UserId,
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let admin = load_user(&pool, user_id).await?;
    require_admin(&admin)?;

    let issue_id = path.into_inner();

    let existing = issue_repo::find_issue_by_id(&pool, issue_id, city_scope(&admin))
        .await?
        .ok_or_else(|| AppError::NotFound("Issue not found or not in your city".to_string()))?;

    if existing.reported_as_fake {
        return Err(AppError::Conflict(
            "This issue has already been reported as fake".to_string(),
        ));
    }

    let issue = issue_repo::mark_issue_fake(&pool, issue_id, admin.id)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("This issue has already been reported as fake".to_string())
        })?;

    let reporter = user_repo::find_user_by_id(&pool, issue.reported_by)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("User who reported this issue not found".to_string())
        })?;

    match abuse_guard::apply_fake_report_penalty(&pool, &reporter, admin.id).await? {
        PenaltyOutcome::Banned { name, email } => Ok(HttpResponse::Ok().json(json!({
            "data": {
                "issue": issue,
                "user": {
                    "id": reporter.id,
                    "name": name,
                    "email": email,
                    "trustScore": 0,
                    "deleted": true,
                    "emailBanned": true,
                },
            },
            "message": format!(
                "Issue reported as fake. User's trust score reduced to 0. \
                 User has been permanently banned and deleted from the system. \
                 Email {} is now blacklisted.",
                reporter.email
            ),
        }))),
        PenaltyOutcome::Penalized { user } => Ok(HttpResponse::Ok().json(json!({
            "data": {
                "issue": issue,
                "user": {
                    "id": user.id,
                    "name": user.name,
                    "email": user.email,
                    "trustScore": user.trust_score,
                    "isBanned": false,
                },
            },
            "message": format!(
                "Issue reported as fake. User's trust score reduced to {}",
                user.trust_score
            ),
        }))),
    }
}

/// GET /api/v1/issues/stats
pub async fn admin_issue_stats(user_id: UserId, pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let user = load_user(&pool, user_id).await?;
    require_admin(&user)?;

    let counts = issue_repo::count_issues_by_status(&pool, city_scope(&user)).await?;

    let stats: Vec<_> = counts
        .into_iter()
        .map(|(status, count)| json!({"status": status, "count": count}))
        .collect();

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/v1/stats/home (public)
pub async fn home_stats(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let (total, resolved, pending) = issue_repo::home_stats_counts(&pool, None).await?;

    let active_zones = ((pending as f64 / 3.0).ceil() as i64).max(1);

    Ok(HttpResponse::Ok().json(json!({
        "reported": total,
        "resolved": resolved,
        "activeZones": active_zones,
    })))
}

/// Pull the submission fields and the photo out of a multipart request
async fn parse_submission(mut payload: Multipart) -> Result<NewSubmission> {
    let mut title = None;
    let mut description = None;
    let mut lat = None;
    let mut lng = None;
    let mut category = None;
    let mut image_bytes = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Invalid multipart data: {}", e)))?;

        let name = field.name().to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::Validation(format!("Invalid multipart data: {}", e)))?;
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "title" => title = Some(text_field(data, "title")?),
            "description" => description = Some(text_field(data, "description")?),
            "lat" => lat = Some(number_field(data, "lat")?),
            "lng" => lng = Some(number_field(data, "lng")?),
            "category" => {
                let value = text_field(data, "category")?;
                if !value.is_empty() {
                    let parsed = IssueCategory::parse(&value).ok_or_else(|| {
                        AppError::Validation(format!("Unknown category '{}'", value))
                    })?;
                    category = Some(parsed.as_str().to_string());
                }
            }
            "image" => image_bytes = data,
            _ => {}
        }
    }

    let (Some(title), Some(description), Some(lat), Some(lng)) = (title, description, lat, lng)
    else {
        return Err(AppError::Validation(
            "All required fields must be provided".to_string(),
        ));
    };

    Ok(NewSubmission {
        title,
        description,
        lat,
        lng,
        category,
        image_bytes,
    })
}

fn text_field(data: Vec<u8>, name: &str) -> Result<String> {
    String::from_utf8(data)
        .map(|s| s.trim().to_string())
        .map_err(|_| AppError::Validation(format!("Field '{}' is not valid text", name)))
}

fn number_field(data: Vec<u8>, name: &str) -> Result<f64> {
    text_field(data, name)?
        .parse()
        .map_err(|_| AppError::Validation(format!("Field '{}' is not a valid number", name)))
}
