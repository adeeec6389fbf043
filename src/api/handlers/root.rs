use axum::response::IntoResponse;

pub const LIVENESS: &str = "ranjivi backend is running";

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Liveness string", body = String, content_type = "text/plain")
    ),
    tag = "health"
)]
pub async fn root() -> impl IntoResponse {
    LIVENESS
}
