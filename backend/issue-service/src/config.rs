use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server configuration
    pub http_port: u16,
    pub host: String,

    // Groq API configuration (empty key = fallback analysis only)
    pub groq_api_key: String,
    pub groq_text_model: String,
    pub groq_vision_model: String,
    pub groq_timeout_secs: u64,

    // Severity fusion weights (text-dominant by default)
    pub severity_text_weight: f64,
    pub severity_image_weight: f64,

    // Abuse guard thresholds
    pub rate_limit_minutes: i64,
    pub daily_issue_limit: i64,
    pub duplicate_radius_meters: f64,
    pub duplicate_issue_threshold: i64,

    // Auth
    pub jwt_secret: String,
    pub access_token_hours: i64,

    // Service configuration
    pub service_name: String,
    pub environment: String,
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            http_port: env_or("HTTP_PORT", 8085),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_text_model: env::var("GROQ_TEXT_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            groq_vision_model: env::var("GROQ_VISION_MODEL")
                .unwrap_or_else(|_| "meta-llama/llama-4-scout-17b-16e-instruct".to_string()),
            groq_timeout_secs: env_or("GROQ_TIMEOUT_SECS", 20),
            severity_text_weight: env_or("SEVERITY_TEXT_WEIGHT", 0.8),
            severity_image_weight: env_or("SEVERITY_IMAGE_WEIGHT", 0.2),
            rate_limit_minutes: env_or("RATE_LIMIT_MINUTES", 15),
            daily_issue_limit: env_or("DAILY_ISSUE_LIMIT", 5),
            duplicate_radius_meters: env_or("DUPLICATE_RADIUS_METERS", 50.0),
            duplicate_issue_threshold: env_or("DUPLICATE_ISSUE_THRESHOLD", 8),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            access_token_hours: env_or("ACCESS_TOKEN_HOURS", 24),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "issue-service".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    /// True when a Groq API key is present and AI analysis can be attempted
    pub fn groq_configured(&self) -> bool {
        !self.groq_api_key.is_empty()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
