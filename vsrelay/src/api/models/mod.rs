//! API request data models.
//!
//! - [`vector_store_files`]: the upload form, the extension allow-list, and the upstream file handle

pub mod vector_store_files;
