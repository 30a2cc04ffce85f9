//! Media host adapter.
//!
//! Thumbnails, lesson videos and display pictures are uploaded to a
//! Cloudinary-compatible host; only the returned URL (and, for videos, the
//! reported duration) is stored.

use chrono::Utc;
use rocket::fs::TempFile;
use rocket::tokio::io::AsyncReadExt;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::MediaConfig;
use crate::error::MediaError;

#[derive(Clone)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MediaFile:{} ({}, {} bytes)",
            self.file_name,
            self.content_type,
            self.bytes.len()
        )
    }
}

impl MediaFile {
    /// Reads an uploaded multipart file into memory.
    pub async fn read(file: &TempFile<'_>) -> Result<MediaFile, MediaError> {
        let content_type = file
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let extension = file
            .content_type()
            .and_then(|ct| ct.extension())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let file_name = format!("{}{}", file.name().unwrap_or("upload"), extension);

        let reader = file.open().await?;
        rocket::tokio::pin!(reader);
        let mut bytes = Vec::with_capacity(file.len() as usize);
        reader.read_to_end(&mut bytes).await?;

        Ok(MediaFile {
            bytes,
            file_name,
            content_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedMedia {
    pub secure_url: String,
    /// Playback length in seconds, reported for audio and video.
    #[serde(default)]
    pub duration: Option<f64>,
}

#[rocket::async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, MediaError>;
}

#[derive(Debug, Deserialize)]
struct HostError {
    error: HostErrorMessage,
}

#[derive(Debug, Deserialize)]
struct HostErrorMessage {
    message: String,
}

pub struct Cloudinary {
    client: reqwest::Client,
    config: MediaConfig,
}

impl Cloudinary {
    pub fn new(config: MediaConfig) -> Cloudinary {
        Cloudinary {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/auto/upload",
            self.config.cloud_name
        )
    }
}

/// SHA-256 request signature over the alphabetically sorted parameters.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!("{:x}", Sha256::digest(format!("{}{}", to_sign, api_secret)))
}

#[rocket::async_trait]
impl MediaHost for Cloudinary {
    #[tracing::instrument(skip(self))]
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<HostError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!("media host rejected upload: {}", message);
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadedMedia = response.json().await?;
        tracing::info!("uploaded media to {}", uploaded.secure_url);
        Ok(uploaded)
    }
}
