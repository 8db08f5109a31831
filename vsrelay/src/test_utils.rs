//! Test utilities: an in-process server wired to a wiremock stand-in for OpenAI.

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::Config;

pub const TEST_API_KEY: &str = "sk-test";

/// Default config pointing at `upstream` as the OpenAI base URL.
pub fn test_config(upstream: &MockServer) -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Config::default()
    };
    config.openai.api_key = Some(TEST_API_KEY.to_string());
    config.openai.base_url = Url::parse(&format!("{}/v1", upstream.uri())).expect("mock server URI is a valid URL");
    config
}

pub fn create_test_app(upstream: &MockServer) -> TestServer {
    create_test_app_with_config(test_config(upstream))
}

pub fn create_test_app_with_config(config: Config) -> TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}

/// Expect `expected_calls` uploads to `/v1/files` carrying the test API key.
pub async fn mock_upload(upstream: &MockServer, response: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .and(header("Authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .respond_with(response)
        .expect(expected_calls)
        .mount(upstream)
        .await;
}

/// Expect `expected_calls` attach calls for `vector_store_id`.
pub async fn mock_attach(upstream: &MockServer, vector_store_id: &str, response: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/vector_stores/{vector_store_id}/files")))
        .and(header("Authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .and(header("OpenAI-Beta", "assistants=v2"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(upstream)
        .await;
}

/// The form the endpoint expects: a `vector_store_id` text field and a named `file` part.
pub fn upload_form(vector_store_id: &str, filename: &str, contents: &str) -> MultipartForm {
    let file_part = Part::bytes(contents.as_bytes().to_vec()).file_name(filename.to_string());
    MultipartForm::new()
        .add_text("vector_store_id", vector_store_id.to_string())
        .add_part("file", file_part)
}
