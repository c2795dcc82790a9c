use sqlx::PgPool;
use uuid::Uuid;

use crate::models::BannedEmail;

/// Append an email to the blacklist. ON CONFLICT keeps the original entry so
/// re-banning is idempotent.
pub async fn insert_banned_email(
    pool: &PgPool,
    email: &str,
    user_id: Option<Uuid>,
    user_name: Option<&str>,
    reason: &str,
    banned_by: Option<Uuid>,
) -> Result<BannedEmail, sqlx::Error> {
    let banned = sqlx::query_as::<_, BannedEmail>(
        r#"
        INSERT INTO banned_emails (email, user_id, user_name, reason, banned_by)
        VALUES (LOWER($1), $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET email = banned_emails.email
        RETURNING id, email, user_id, user_name, reason, banned_by, banned_at
        "#,
    )
    .bind(email)
    .bind(user_id)
    .bind(user_name)
    .bind(reason)
    .bind(banned_by)
    .fetch_one(pool)
    .await?;

    Ok(banned)
}

/// Whether an email is blacklisted (case-insensitive)
pub async fn is_email_banned(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM banned_emails WHERE email = LOWER($1))",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
