pub mod abuse_guard;
pub mod content_validator;
pub mod email_service;
pub mod image_analyzer;
pub mod intake;
pub mod scoring;
pub mod text_analyzer;
