use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Issue, ScoreBreakdown};

const ISSUE_COLUMNS: &str = r#"id, title, description, image_url, category, city, lat, lng,
       priority_score, priority, status, severity_score, frequency_score,
       location_impact, time_pending, ai_adjustment, reported_by,
       reported_as_fake, reported_as_fake_by, reported_as_fake_at,
       created_at, updated_at"#;

pub struct NewIssue<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
    pub category: &'a str,
    pub city: &'a str,
    pub lat: f64,
    pub lng: f64,
    pub priority_score: i32,
    pub priority: &'a str,
    pub breakdown: ScoreBreakdown,
    pub reported_by: Uuid,
}

/// Insert a new issue with status "Pending"
pub async fn create_issue(pool: &PgPool, new: NewIssue<'_>) -> Result<Issue, sqlx::Error> {
    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        INSERT INTO issues (title, description, image_url, category, city, lat, lng,
                            priority_score, priority, status, severity_score,
                            frequency_score, location_impact, time_pending,
                            ai_adjustment, reported_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Pending', $10, $11, $12, $13, $14, $15)
        RETURNING {ISSUE_COLUMNS}
        "#
    ))
    .bind(new.title)
    .bind(new.description)
    .bind(new.image_url)
    .bind(new.category)
    .bind(new.city)
    .bind(new.lat)
    .bind(new.lng)
    .bind(new.priority_score)
    .bind(new.priority)
    .bind(new.breakdown.severity)
    .bind(new.breakdown.frequency)
    .bind(new.breakdown.location_impact)
    .bind(new.breakdown.time_pending)
    .bind(new.breakdown.ai_adjustment)
    .bind(new.reported_by)
    .fetch_one(pool)
    .await?;

    Ok(issue)
}

/// Find an issue by ID, optionally restricted to a city
pub async fn find_issue_by_id(
    pool: &PgPool,
    issue_id: Uuid,
    city: Option<&str>,
) -> Result<Option<Issue>, sqlx::Error> {
    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        SELECT {ISSUE_COLUMNS}
        FROM issues
        WHERE id = $1 AND ($2::text IS NULL OR city = $2)
        "#
    ))
    .bind(issue_id)
    .bind(city)
    .fetch_optional(pool)
    .await?;

    Ok(issue)
}

/// Most recent issue by a reporter, used for the cooldown check
pub async fn latest_issue_by_reporter(
    pool: &PgPool,
    reporter: Uuid,
) -> Result<Option<Issue>, sqlx::Error> {
    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        SELECT {ISSUE_COLUMNS}
        FROM issues
        WHERE reported_by = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#
    ))
    .bind(reporter)
    .fetch_optional(pool)
    .await?;

    Ok(issue)
}

/// Count issues by a reporter created at or after the given instant
pub async fn count_issues_by_reporter_since(
    pool: &PgPool,
    reporter: Uuid,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM issues WHERE reported_by = $1 AND created_at >= $2",
    )
    .bind(reporter)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count issues inside a coordinate bounding box (any status)
pub async fn count_issues_in_box(
    pool: &PgPool,
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM issues
        WHERE lat BETWEEN $1 AND $2 AND lng BETWEEN $3 AND $4
        "#,
    )
    .bind(lat_min)
    .bind(lat_max)
    .bind(lng_min)
    .bind(lng_max)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count unresolved issues platform-wide, the frequency-score input
pub async fn count_unresolved_issues(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM issues WHERE status <> 'Resolved'")
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// All issues (optionally city-scoped), highest priority first
pub async fn list_issues(pool: &PgPool, city: Option<&str>) -> Result<Vec<Issue>, sqlx::Error> {
    let issues = sqlx::query_as::<_, Issue>(&format!(
        r#"
        SELECT {ISSUE_COLUMNS}
        FROM issues
        WHERE ($1::text IS NULL OR city = $1)
        ORDER BY priority_score DESC, created_at DESC
        "#
    ))
    .bind(city)
    .fetch_all(pool)
    .await?;

    Ok(issues)
}

/// Unresolved issues (optionally city-scoped), highest priority first
pub async fn list_unresolved_issues(
    pool: &PgPool,
    city: Option<&str>,
) -> Result<Vec<Issue>, sqlx::Error> {
    let issues = sqlx::query_as::<_, Issue>(&format!(
        r#"
        SELECT {ISSUE_COLUMNS}
        FROM issues
        WHERE status <> 'Resolved' AND ($1::text IS NULL OR city = $1)
        ORDER BY priority_score DESC, created_at DESC
        "#
    ))
    .bind(city)
    .fetch_all(pool)
    .await?;

    Ok(issues)
}

/// Update the lifecycle status of an issue, scoped to the caller's city.
/// Returns None if the issue does not exist or lies outside the scope.
pub async fn update_issue_status(
    pool: &PgPool,
    issue_id: Uuid,
    status: &str,
    city: Option<&str>,
) -> Result<Option<Issue>, sqlx::Error> {
    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        UPDATE issues
        SET status = $2, updated_at = NOW()
        WHERE id = $1 AND ($3::text IS NULL OR city = $3)
        RETURNING {ISSUE_COLUMNS}
        "#
    ))
    .bind(issue_id)
    .bind(status)
    .bind(city)
    .fetch_optional(pool)
    .await?;

    Ok(issue)
}

/// Flag an issue as fake. Only flips issues not already flagged, so a
/// concurrent second admin gets None back instead of double-penalizing.
pub async fn mark_issue_fake(
    pool: &PgPool,
    issue_id: Uuid,
    admin_id: Uuid,
) -> Result<Option<Issue>, sqlx::Error> {
    let issue = sqlx::query_as::<_, Issue>(&format!(
        r#"
        UPDATE issues
        SET reported_as_fake = TRUE,
            reported_as_fake_by = $2,
            reported_as_fake_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND reported_as_fake = FALSE
        RETURNING {ISSUE_COLUMNS}
        "#
    ))
    .bind(issue_id)
    .bind(admin_id)
    .fetch_optional(pool)
    .await?;

    Ok(issue)
}

/// Per-status issue counts, optionally city-scoped
pub async fn count_issues_by_status(
    pool: &PgPool,
    city: Option<&str>,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*) FROM issues
        WHERE ($1::text IS NULL OR city = $1)
        GROUP BY status
        "#,
    )
    .bind(city)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Aggregate counts backing the public homepage
pub async fn home_stats_counts(
    pool: &PgPool,
    city: Option<&str>,
) -> Result<(i64, i64, i64), sqlx::Error> {
    let (total, resolved, pending): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE status = 'Resolved'),
               COUNT(*) FILTER (WHERE status <> 'Resolved')
        FROM issues
        WHERE ($1::text IS NULL OR city = $1)
        "#,
    )
    .bind(city)
    .fetch_one(pool)
    .await?;

    Ok((total, resolved, pending))
}
