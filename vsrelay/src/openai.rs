//! Outbound client for the two OpenAI calls the relay makes.
//!
//! ```text
//! OpenAiClient
//!   ├─ upload_file()   POST {base}/files                         multipart: purpose=user_data, file
//!   │                  └─ returns FileHandle { id }
//!   └─ attach_file()   POST {base}/vector_stores/{id}/files       json: {"file_id": ...}
//!                      └─ returns the response body untouched
//! ```
//!
//! Each call has its own error type so the handler can decide which status code the caller sees.
//! Nothing here retries: one request in, at most one upload and one attach out.

use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use crate::api::models::vector_store_files::FileHandle;
use crate::config::OpenAiConfig;

/// Purpose tag sent with every upload.
pub const UPLOAD_PURPOSE: &str = "user_data";

/// Install the process-wide rustls crypto provider.
///
/// reqwest is built without a bundled provider, so this must run before the first client is
/// built. Calling it again is a no-op.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Failure of the upload call.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The API rejected the request itself (bad file, bad purpose, ...)
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },

    /// Any other non-success status
    #[error("OpenAI responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Success status, but no usable file object in the body
    #[error("unexpected upload response: {0}")]
    MalformedResponse(String),

    /// Connection, TLS or timeout failure
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("base URL {0} cannot carry path segments")]
    BaseUrl(Url),
}

/// Failure of the attach call.
#[derive(Debug, Error)]
pub enum AttachError {
    /// Anything but 200; the caller receives this status and body as-is
    #[error("{body}")]
    Status { status: StatusCode, body: String },

    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Connection, TLS or timeout failure
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("base URL {0} cannot carry path segments")]
    BaseUrl(Url),
}

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the OpenAI files and vector store APIs.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    beta_header: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient").field("base_url", &self.base_url.as_str()).finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a client from configuration. Fails if no API key is configured.
    pub fn new(config: &OpenAiConfig) -> anyhow::Result<Self> {
        install_crypto_provider();

        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key is not configured"))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("vsrelay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            beta_header: config.beta_header.clone(),
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
        Some(url)
    }

    /// Upload `contents` to the files API and return the identifier it was stored under.
    #[tracing::instrument(skip(self, contents), fields(size = contents.len()))]
    pub async fn upload_file(&self, filename: &str, contents: Vec<u8>) -> Result<FileHandle, UploadError> {
        let url = self.endpoint(&["files"]).ok_or_else(|| UploadError::BaseUrl(self.base_url.clone()))?;

        let form = Form::new()
            .text("purpose", UPLOAD_PURPOSE)
            .part("file", Part::bytes(contents).file_name(filename.to_string()));

        tracing::debug!(url = %url, "Uploading file");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "File upload request failed"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_upload_failure(status, body));
        }

        let file: FileObject = serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        if file.id.is_empty() {
            return Err(UploadError::MalformedResponse("empty file id".to_string()));
        }

        tracing::info!(file_id = %file.id, "File uploaded");
        Ok(FileHandle::new(file.id))
    }

    /// Attach an uploaded file to a vector store and return the API's response body.
    #[tracing::instrument(skip(self, file), fields(file_id = %file.id()))]
    pub async fn attach_file(&self, vector_store_id: &str, file: &FileHandle) -> Result<Value, AttachError> {
        let url = self
            .endpoint(&["vector_stores", vector_store_id, "files"])
            .ok_or_else(|| AttachError::BaseUrl(self.base_url.clone()))?;

        tracing::debug!(url = %url, "Attaching file to vector store");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", &self.beta_header)
            .json(&json!({ "file_id": file.id() }))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Vector store request failed"))?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            tracing::error!(status = status.as_u16(), body = %body, "Error updating vector store");
            return Err(AttachError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// 400, 404 and 415 mean the request itself was refused; everything else is a service failure.
fn classify_upload_failure(status: StatusCode, body: String) -> UploadError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), message = %message, "Invalid request to OpenAI");
            UploadError::InvalidRequest { status, message }
        }
        _ => {
            tracing::error!(status = status.as_u16(), body = %body, "Failed to upload file to OpenAI");
            UploadError::Status { status, body }
        }
    }
}
