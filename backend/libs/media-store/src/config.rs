/// Object storage configuration for issue photos
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaStoreConfig {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (CDN domain)
    pub base_url: String,
    /// Key prefix for issue photos
    pub key_prefix: String,
}

impl MediaStoreConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "civicpulse-media".to_string()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            base_url: std::env::var("S3_BASE_URL")
                .unwrap_or_else(|_| "https://media.civicpulse.dev".to_string()),
            key_prefix: std::env::var("S3_KEY_PREFIX").unwrap_or_else(|_| "issues".to_string()),
        }
    }

    /// Public URL for a stored object
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}
