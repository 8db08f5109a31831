//! HTTP request handlers for all API endpoints.
//!
//! # Handler Modules
//!
//! - [`health`]: Liveness probe
//! - [`vector_store_files`]: Upload a file and attach it to an OpenAI vector store
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Result`]; every error becomes a `{"detail": "..."}` JSON
//! response with the status chosen by [`crate::errors::Error::status_code`].

pub mod health;
pub mod vector_store_files;
