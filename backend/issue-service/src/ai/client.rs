//! Groq chat-completion client
//!
//! The Groq API is OpenAI-compatible; the same endpoint serves both the text
//! model and the vision model (image passed by URL in the message content).
//! The client is constructed once at startup and handed to the analyzers by
//! reference; analyzers treat every transport or parse failure as a fallback
//! trigger, so nothing here retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("AI service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI reply had no content")]
    EmptyReply,
}

/// Chat-completion capability consumed by the analyzers.
///
/// A trait seam so tests can substitute a scripted client for the real one.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Run a text-only completion and return the raw reply text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError>;

    /// Run a completion over an image URL plus instructions
    async fn complete_with_image(&self, prompt: &str, image_url: &str)
        -> Result<String, AiError>;
}

/// Groq API client
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    text_model: String,
    vision_model: String,
}

impl GroqClient {
    pub fn new(
        api_key: &str,
        text_model: &str,
        vision_model: &str,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            text_model: text_model.to_string(),
            vision_model: vision_model.to_string(),
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, AiError> {
        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyReply)
    }
}

#[async_trait]
impl CompletionApi for GroqClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let request = ChatRequest {
            model: self.text_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(system.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Text(prompt.to_string()),
                },
            ],
            temperature: 0.3,
            max_tokens: 200,
        };

        self.send(&request).await
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image_url: &str,
    ) -> Result<String, AiError> {
        let request = ChatRequest {
            model: self.vision_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_url.to_string(),
                        },
                    },
                ]),
            }],
            temperature: 0.3,
            max_tokens: 300,
        };

        self.send(&request).await
    }
}

// ============================================
// Wire types (OpenAI-compatible)
// ============================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_serializes_flat_content() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text("hello".to_string()),
            }],
            temperature: 0.3,
            max_tokens: 200,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_vision_request_serializes_parts() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: "describe".to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "https://example.com/a.png".to_string(),
                        },
                    },
                ]),
            }],
            temperature: 0.3,
            max_tokens: 300,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "https://example.com/a.png"
        );
    }
}
