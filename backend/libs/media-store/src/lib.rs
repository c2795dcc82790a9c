//! Object storage for citizen-submitted issue photos
//!
//! Wraps the AWS S3 client with the one operation the intake pipeline needs:
//! store an uploaded photo under a fresh key and hand back a durable public
//! URL. Photos arriving in encodings the vision model cannot consume
//! (AVIF, WEBP, ...) are transcoded to PNG before storage, so every stored
//! URL points at a mainstream encoding.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use image::ImageFormat;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod config;

pub use config::MediaStoreConfig;

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("unsupported or corrupt image data: {0}")]
    InvalidImage(String),

    #[error("image transcoding failed: {0}")]
    Transcode(String),

    #[error("object storage request failed: {0}")]
    Storage(String),
}

/// A photo stored durably in object storage
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub key: String,
    pub url: String,
    pub content_type: &'static str,
}

/// S3-backed photo store
#[derive(Clone)]
pub struct MediaStore {
    client: Arc<Client>,
    config: MediaStoreConfig,
}

impl MediaStore {
    /// Create a new store with configuration from the environment
    pub async fn from_env() -> Self {
        let config = MediaStoreConfig::from_env();
        let aws_config = aws_config::load_from_env().await;
        let client = Client::new(&aws_config);

        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn with_client(client: Arc<Client>, config: MediaStoreConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &MediaStoreConfig {
        &self.config
    }

    /// Store an issue photo and return its public URL.
    ///
    /// JPEG and PNG pass through unchanged; other decodable formats are
    /// re-encoded to PNG first.
    pub async fn store_photo(&self, bytes: Vec<u8>) -> Result<StoredPhoto, MediaStoreError> {
        let (body, extension, content_type) = normalize_encoding(bytes)?;

        let key = format!("{}/{}.{}", self.config.key_prefix, Uuid::new_v4(), extension);

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| MediaStoreError::Storage(e.to_string()))?;

        let url = self.config.public_url(&key);
        tracing::debug!(key = %key, "Issue photo stored");

        Ok(StoredPhoto {
            key,
            url,
            content_type,
        })
    }

    /// Delete a stored photo (cleanup path, best effort at call sites)
    pub async fn delete_photo(&self, key: &str) -> Result<(), MediaStoreError> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MediaStoreError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Health check for bucket connectivity
    pub async fn health_check(&self) -> Result<(), MediaStoreError> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| MediaStoreError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// Normalize photo bytes to an encoding the vision model accepts.
///
/// Returns the (possibly transcoded) bytes together with the file extension
/// and content type they should be stored under.
fn normalize_encoding(
    bytes: Vec<u8>,
) -> Result<(Vec<u8>, &'static str, &'static str), MediaStoreError> {
    let format = image::guess_format(&bytes)
        .map_err(|e| MediaStoreError::InvalidImage(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => Ok((bytes, "jpg", "image/jpeg")),
        ImageFormat::Png => Ok((bytes, "png", "image/png")),
        _ => {
            let decoded = image::load_from_memory(&bytes)
                .map_err(|e| MediaStoreError::InvalidImage(e.to_string()))?;

            let mut png = Cursor::new(Vec::new());
            decoded
                .write_to(&mut png, ImageFormat::Png)
                .map_err(|e| MediaStoreError::Transcode(e.to_string()))?;

            Ok((png.into_inner(), "png", "image/png"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_png_passes_through() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let bytes = encode(&img, ImageFormat::Png);

        let (out, ext, ct) = normalize_encoding(bytes.clone()).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(ext, "png");
        assert_eq!(ct, "image/png");
    }

    #[test]
    fn test_jpeg_passes_through() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let bytes = encode(&img, ImageFormat::Jpeg);

        let (out, ext, ct) = normalize_encoding(bytes.clone()).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(ext, "jpg");
        assert_eq!(ct, "image/jpeg");
    }

    #[test]
    fn test_webp_transcodes_to_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let bytes = encode(&img, ImageFormat::WebP);

        let (out, ext, ct) = normalize_encoding(bytes).unwrap();
        assert_eq!(ext, "png");
        assert_eq!(ct, "image/png");
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_garbage_rejected() {
        let result = normalize_encoding(vec![0u8; 32]);
        assert!(matches!(result, Err(MediaStoreError::InvalidImage(_))));
    }
}
