//! Upload a file to OpenAI and attach it to a vector store in one request.
//!
//! ```text
//! POST /add_file_to_vector_store (multipart: vector_store_id, file)
//!   ├─ parse form                 400 on malformed multipart or missing fields, 413 if too large
//!   ├─ validate filename          400 unless the extension is allow-listed
//!   ├─ OpenAI: upload file        400 if rejected as invalid, 500 on any other failure
//!   └─ OpenAI: attach to store    upstream status + body if not 200, otherwise its JSON as-is
//! ```

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde_json::Value;

use crate::AppState;
use crate::api::models::vector_store_files::{UploadRequest, UploadedFile};
use crate::errors::{Error, Result};

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: format!("Request body too large: {}", err.body_text()),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", err.body_text()),
        }
    }
}

/// Read the form into memory. Unknown fields are skipped.
async fn read_upload_request(mut multipart: Multipart, max_upload_size: u64) -> Result<UploadRequest> {
    let mut vector_store_id: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "vector_store_id" => {
                vector_store_id = Some(field.text().await.map_err(multipart_error)?);
            }
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let contents = field.bytes().await.map_err(multipart_error)?;

                if contents.len() as u64 > max_upload_size {
                    tracing::warn!(
                        filename = ?filename,
                        size = contents.len(),
                        max_upload_size = max_upload_size,
                        "File size limit exceeded"
                    );
                    return Err(Error::PayloadTooLarge {
                        message: format!(
                            "File size exceeds maximum allowed size of {} bytes ({} MB)",
                            max_upload_size,
                            max_upload_size / (1024 * 1024)
                        ),
                    });
                }

                file = Some(UploadedFile {
                    filename,
                    contents: contents.into(),
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(UploadRequest::from_parts(vector_store_id, file)?)
}

#[utoipa::path(
    post,
    path = "/add_file_to_vector_store",
    tag = "vector_stores",
    summary = "Add file to vector store",
    description = "Upload a file to OpenAI with purpose `user_data`, then attach it to the given vector store. \
The response body is the vector store file object returned by OpenAI, unchanged.

Accepted extensions: .c, .cs, .cpp, .doc, .docx, .html, .java, .json, .md, .pdf, .php, .pptx, .py, .rb, .tex, .txt, .css, .js, .sh, .ts",
    request_body(
        content_type = "multipart/form-data",
        description = "Form with a `vector_store_id` text field and a `file` part carrying a filename"
    ),
    responses(
        (status = 200, description = "File attached; body is the upstream vector store file object"),
        (status = 400, description = "Invalid form, unsupported extension, or request rejected by OpenAI", body = crate::errors::ErrorDetail),
        (status = 413, description = "File too large", body = crate::errors::ErrorDetail),
        (status = 500, description = "Upload failed or the vector store could not be updated", body = crate::errors::ErrorDetail),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_file_to_vector_store(State(state): State<AppState>, multipart: Multipart) -> Result<Json<Value>> {
    let UploadRequest { vector_store_id, file } = read_upload_request(multipart, state.config.limits.max_upload_size).await?;

    let (filename, extension) = file.validate()?;
    let filename = filename.to_string();

    tracing::info!(
        vector_store_id = %vector_store_id,
        filename = %filename,
        extension = %extension,
        size = file.contents.len(),
        "Adding file to vector store"
    );

    let handle = state.openai.upload_file(&filename, file.contents).await?;
    let linked = state.openai.attach_file(&vector_store_id, &handle).await?;

    tracing::info!(vector_store_id = %vector_store_id, file_id = %handle.id(), "File added to vector store");
    Ok(Json(linked))
}
