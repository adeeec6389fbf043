use axum::{
    extract::{ConnectInfo, Extension},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{debug, instrument};

use super::{
    scheme::{auth_scheme, AuthScheme, Issued, Rejection},
    state::AuthState,
    types::{AuthResponse, LoginRequest},
    utils::client_key,
};
use crate::api::{
    error::ApiError,
    handlers::{
        config::LabConfig,
        storage::{CredentialStore, Credentials},
    },
};

/// Compare a password against stored credentials under the given scheme.
///
/// The scheme's gate runs before the comparison, so a locked-out client is
/// refused even when the password is right.
///
/// # Errors
/// Returns the scheme's rejection for a refused client, an unknown user or a
/// wrong password.
pub async fn authenticate(
    scheme: &dyn AuthScheme,
    state: &AuthState,
    client: &str,
    credentials: Option<&Credentials>,
    password: Option<&str>,
) -> Result<Issued, ApiError> {
    scheme.admit(state, client).await?;

    let Some(credentials) = credentials else {
        return Err(scheme.reject(state, client, Rejection::UnknownUser).await);
    };

    // Plain equality: passwords are stored in clear text.
    if password != Some(credentials.password.as_str()) {
        return Err(scheme.reject(state, client, Rejection::WrongPassword).await);
    }

    scheme.issue(state, client, &credentials.username).await
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, cookie set", body = AuthResponse),
        (status = 400, description = "Username required"),
        (status = 401, description = "Unknown user or wrong password"),
        (status = 429, description = "Client locked out after repeated failures"),
        (status = 500, description = "Unexpected failure")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    config: Extension<Arc<LabConfig>>,
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn CredentialStore>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let Some(username) = request.username() else {
        return Err(ApiError::InvalidInput("Username required".to_string()));
    };

    let mode = config.auth_mode();
    let client = client_key(peer.map(|ConnectInfo(addr)| addr), &headers);
    debug!(mode = mode.as_str(), client = %client, "login attempt");

    let credentials = store.find_credentials(&username).await?;

    let issued = authenticate(
        auth_scheme(mode),
        &auth_state,
        &client,
        credentials.as_ref(),
        request.password(),
    )
    .await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, issued.cookie);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(AuthResponse {
            ok: true,
            message: issued.message.to_string(),
        }),
    )
        .into_response())
}
