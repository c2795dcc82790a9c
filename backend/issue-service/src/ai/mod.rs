pub mod client;
pub mod json_extract;

pub use client::{CompletionApi, GroqClient};
pub use json_extract::{extract_json_payload, JsonExtractError};
