/// Error types for the issue service
///
/// Every user-visible failure carries a human-readable reason; upstream AI
/// failures never reach this enum (analyzers absorb them into the fallback
/// path), so the variants map one-to-one onto HTTP outcomes.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

/// Result type for issue-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Submission failed content or shape validation
    Validation(String),

    /// Reporter is submitting too fast; retry after the given minutes
    RateLimited { reason: String, retry_after_minutes: i64 },

    /// Conflicting state (duplicate location, already flagged, ...)
    Conflict(String),

    /// Resource not found (or outside the caller's city scope)
    NotFound(String),

    /// Missing or invalid credentials
    Unauthorized(String),

    /// Authenticated but not allowed
    Forbidden(String),

    /// Photo could not be stored
    Upload(String),

    /// Database operation failed
    Database(String),

    /// Internal server error
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::RateLimited { reason, .. } => write!(f, "{}", reason),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Unauthorized(msg) => write!(f, "{}", msg),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::Upload(msg) => write!(f, "Image upload failed: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upload(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Never leak raw upstream/database detail to callers
        let message = match self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                "Something went wrong. Please try again later.".to_string()
            }
            AppError::Upload(_) => {
                tracing::error!(error = %self, "Photo storage failed");
                "Image upload failed. Please try again.".to_string()
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        if let AppError::RateLimited { retry_after_minutes, .. } = self {
            body["retryAfterMinutes"] = serde_json::json!(retry_after_minutes);
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<media_store::MediaStoreError> for AppError {
    fn from(err: media_store::MediaStoreError) -> Self {
        match err {
            media_store::MediaStoreError::InvalidImage(msg) => {
                AppError::Validation(format!("Invalid image: {}", msg))
            }
            other => AppError::Upload(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RateLimited {
                reason: "wait".into(),
                retry_after_minutes: 10
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Upload("s3 down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
