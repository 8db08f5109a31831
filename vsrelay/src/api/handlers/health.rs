//! Liveness endpoint.

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    summary = "Liveness probe",
    description = "Returns OK while the process is serving requests. Does not contact OpenAI.",
    responses(
        (status = 200, description = "Service is running", body = String),
    )
)]
pub async fn healthz() -> &'static str {
    "OK"
}
