//! Registration and login
//!
//! Blacklisted emails are rejected on both paths with 403, so a banned
//! reporter can neither sign in nor re-register with the same address.

use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db::{banned_email_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{jwt, password};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /api/v1/auth/register
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();
    let city = body.city.trim();

    if name.is_empty() || email.is_empty() || city.is_empty() {
        return Err(AppError::Validation(
            "Name, email and city are required".to_string(),
        ));
    }

    if !EMAIL_REGEX.is_match(&email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    if banned_email_repo::is_email_banned(&pool, &email).await? {
        return Err(AppError::Forbidden(
            "This email address has been banned from the platform".to_string(),
        ));
    }

    if user_repo::find_user_by_email(&pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let hash = password::hash_password(&body.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = user_repo::create_user(&pool, name, &email, &hash, city).await?;

    info!(user = %user.id, "User registered");

    let response = auth_response(&config, user)?;
    Ok(HttpResponse::Created().json(response))
}

/// POST /api/v1/auth/login
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let email = body.email.trim().to_lowercase();

    if banned_email_repo::is_email_banned(&pool, &email).await? {
        return Err(AppError::Forbidden(
            "This email address has been banned from the platform".to_string(),
        ));
    }

    let user = user_repo::find_user_by_email(&pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&body.password, &user.password_hash) {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    info!(user = %user.id, "User logged in");

    let response = auth_response(&config, user)?;
    Ok(HttpResponse::Ok().json(response))
}

fn auth_response(config: &Config, user: User) -> Result<AuthResponse> {
    let token = jwt::generate_access_token(
        &config.jwt_secret,
        user.id,
        &user.email,
        &user.name,
        config.access_token_hours,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        user,
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_hours * 3600,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_regex() {
        assert!(EMAIL_REGEX.is_match("asha@example.com"));
        assert!(!EMAIL_REGEX.is_match("not-an-email"));
        assert!(!EMAIL_REGEX.is_match("two@@example.com"));
        assert!(!EMAIL_REGEX.is_match("spaces in@example.com"));
    }
}
