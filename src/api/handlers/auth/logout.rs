use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{scheme::auth_scheme, state::AuthState, types::AuthResponse};
use crate::api::handlers::config::LabConfig;

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Cookie of the current auth mode cleared", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    config: Extension<Arc<LabConfig>>,
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Each mode only knows its own cookie; the other one is left alone.
    let revoked = auth_scheme(config.auth_mode())
        .revoke(&auth_state, &headers)
        .await;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, revoked.cookie);

    (
        StatusCode::OK,
        response_headers,
        Json(AuthResponse {
            ok: true,
            message: revoked.message.to_string(),
        }),
    )
}
