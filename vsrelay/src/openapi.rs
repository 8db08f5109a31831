//! OpenAPI documentation for the relay.
//!
//! Served as JSON at `/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::errors::ErrorDetail;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vsrelay",
        description = "Upload files to OpenAI and attach them to a vector store in a single request."
    ),
    paths(handlers::vector_store_files::add_file_to_vector_store, handlers::health::healthz),
    components(schemas(ErrorDetail)),
    tags(
        (name = "vector_stores", description = "Vector store file ingestion"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/add_file_to_vector_store"));
        assert!(doc.paths.paths.contains_key("/healthz"));
        assert!(doc.components.as_ref().unwrap().schemas.contains_key("ErrorDetail"));
    }
}
