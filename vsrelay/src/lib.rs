//! # vsrelay: add files to OpenAI vector stores over plain HTTP
//!
//! `vsrelay` is a small HTTP service that takes a multipart upload, stores the file with the
//! OpenAI files API, and attaches the stored file to a vector store. Callers need one request
//! and no OpenAI credentials of their own: the relay holds the API key.
//!
//! ## Request Flow
//!
//! A `POST /add_file_to_vector_store` request carries a `vector_store_id` text field and a `file`
//! part. The handler in [`api::handlers::vector_store_files`] reads the form into memory, checks
//! the filename against the extension allow-list, then makes two sequential calls through
//! [`openai::OpenAiClient`]:
//!
//! 1. `POST /v1/files` with purpose `user_data`, which returns a file id
//! 2. `POST /v1/vector_stores/{id}/files` with that file id
//!
//! The second call's JSON body is returned unchanged. Failures become `{"detail": "..."}`
//! responses; see [`errors::Error`] for the status mapping. Requests share no mutable state and
//! nothing is retried.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use vsrelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = vsrelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     vsrelay::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod errors;
pub mod openai;
mod openapi;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use openai::OpenAiClient;
use openapi::ApiDoc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Immutable after startup. Cloning is cheap: the HTTP client inside [`OpenAiClient`] is
/// reference counted.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .openai(OpenAiClient::new(&config.openai)?)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub openai: OpenAiClient,
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.limits.request_body_limit();

    let router = Router::new()
        .route(
            "/add_file_to_vector_store",
            post(api::handlers::vector_store_files::add_file_to_vector_store).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/healthz", get(api::handlers::health::healthz))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] builds the OpenAI client and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting vsrelay with configuration: {:#?}", config);

        let openai = OpenAiClient::new(&config.openai)?;
        let state = AppState::builder().config(config.clone()).openai(openai).build();
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "vsrelay listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::{create_test_app, mock_attach, mock_upload, test_config, upload_form};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use wiremock::{MockServer, ResponseTemplate};

    /// Integration test: a real listener in front of the router, with the OpenAI side mocked.
    #[test_log::test(tokio::test)]
    async fn test_serve_round_trip_over_tcp() {
        let upstream = MockServer::start().await;
        mock_upload(&upstream, ResponseTemplate::new(200).set_body_json(json!({ "id": "file-tcp" })), 1).await;
        mock_attach(
            &upstream,
            "vs_tcp",
            ResponseTemplate::new(200).set_body_json(json!({ "id": "file-tcp", "object": "vector_store.file" })),
            1,
        )
        .await;

        // Reserve a free port, then hand it to the application
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let mut config = test_config(&upstream);
        config.port = port;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = super::Application::new(config).unwrap();
        let server = tokio::spawn(app.serve(async {
            let _ = shutdown_rx.await;
        }));

        // Wait for the listener before sending the upload, so the upload goes out exactly once
        let base = format!("http://127.0.0.1:{port}");
        let client = reqwest::Client::new();
        let mut ready = false;
        for _ in 0..50 {
            if client.get(format!("{base}/healthz")).send().await.is_ok() {
                ready = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(ready, "server did not start");

        let form = reqwest::multipart::Form::new().text("vector_store_id", "vs_tcp").part(
            "file",
            reqwest::multipart::Part::bytes(b"print('hi')".to_vec()).file_name("script.py"),
        );
        let response = client
            .post(format!("{base}/add_file_to_vector_store"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "id": "file-tcp", "object": "vector_store.file" }));

        shutdown_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_docs_and_openapi_are_served() {
        let upstream = MockServer::start().await;
        let app = create_test_app(&upstream);

        let response = app.get("/openapi.json").await;
        response.assert_status(StatusCode::OK);
        let doc: Value = response.json();
        assert!(doc["paths"]["/add_file_to_vector_store"]["post"].is_object());

        let response = app.get("/docs").await;
        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("<html"));
    }

    #[tokio::test]
    async fn test_unrouted_requests_are_rejected() {
        let upstream = MockServer::start().await;
        let app = create_test_app(&upstream);

        app.get("/add_file_to_vector_store").await.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        app.post("/v1/files").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_route_is_wired() {
        let upstream = MockServer::start().await;
        let app = create_test_app(&upstream);

        app.get("/healthz").await.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_flow_through_router() {
        let upstream = MockServer::start().await;
        mock_upload(&upstream, ResponseTemplate::new(200).set_body_json(json!({ "id": "file-1" })), 1).await;
        mock_attach(&upstream, "vs_1", ResponseTemplate::new(200).set_body_json(json!({ "id": "link-123" })), 1).await;

        let app = create_test_app(&upstream);
        let response = app
            .post("/add_file_to_vector_store")
            .multipart(upload_form("vs_1", "paper.pdf", "%PDF-1.4"))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "id": "link-123" }));
    }
}
