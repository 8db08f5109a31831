//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request data structures and validation
//!
//! # API Structure
//!
//! - `POST /add_file_to_vector_store`: upload a file to OpenAI and attach it to a vector store
//! - `GET /healthz`: liveness probe
//! - `GET /openapi.json`, `GET /docs`: OpenAPI document and its rendered reference

pub mod handlers;
pub mod models;
