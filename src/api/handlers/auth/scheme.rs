//! Login/logout strategies, one per auth mode.
//!
//! `ForgeableCookie` is the broken scheme: the cookie is derived from the
//! username, readable by scripts, and nothing is kept server-side.
//! `ServerSession` keeps a random session id server-side and puts the
//! brute-force lockout in front of the password comparison.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use tracing::{error, info};

use super::{
    session::{
        clear_cookie, extract_cookie, set_cookie, SECURE_COOKIE_NAME, VULNERABLE_COOKIE_NAME,
    },
    state::AuthState,
};
use crate::api::{error::ApiError, handlers::config::Mode};

pub const LOCKED_MESSAGE: &str = "Account temporarily locked due to too many failed attempts";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const UNKNOWN_USERNAME: &str = "Username dosnt exist in database";
pub const INCORRECT_PASSWORD: &str = "Incorrect password";

/// Why a credential check failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    UnknownUser,
    WrongPassword,
}

#[derive(Debug)]
pub struct Issued {
    pub cookie: HeaderValue,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct Revoked {
    pub cookie: HeaderValue,
    pub message: &'static str,
}

#[async_trait]
pub trait AuthScheme: Send + Sync {
    /// Decide whether `client` may attempt a login at all.
    async fn admit(&self, state: &AuthState, client: &str) -> Result<(), ApiError>;

    /// Account for a failed attempt and build the error returned to the caller.
    async fn reject(&self, state: &AuthState, client: &str, reason: Rejection) -> ApiError;

    /// Account for a successful attempt and hand out a credential.
    async fn issue(
        &self,
        state: &AuthState,
        client: &str,
        username: &str,
    ) -> Result<Issued, ApiError>;

    /// Forget whatever credential the request carries.
    async fn revoke(&self, state: &AuthState, headers: &HeaderMap) -> Revoked;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ForgeableCookie;

#[async_trait]
impl AuthScheme for ForgeableCookie {
    async fn admit(&self, _state: &AuthState, _client: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn reject(&self, _state: &AuthState, _client: &str, reason: Rejection) -> ApiError {
        let message = match reason {
            Rejection::UnknownUser => UNKNOWN_USERNAME,
            Rejection::WrongPassword => INCORRECT_PASSWORD,
        };
        ApiError::Unauthorized(message.to_string())
    }

    async fn issue(
        &self,
        _state: &AuthState,
        _client: &str,
        username: &str,
    ) -> Result<Issued, ApiError> {
        let token = format!("{username}-token");
        let cookie = set_cookie(VULNERABLE_COOKIE_NAME, &token, false).map_err(|err| {
            error!("Failed to build session cookie: {err}");
            ApiError::Internal(err.to_string())
        })?;
        info!(username, "issued forgeable session cookie");
        Ok(Issued {
            cookie,
            message: "Logged in (vulnerable). Session cookie set and readable by JS.",
        })
    }

    async fn revoke(&self, _state: &AuthState, _headers: &HeaderMap) -> Revoked {
        Revoked {
            cookie: clear_cookie(VULNERABLE_COOKIE_NAME),
            message: "Logged out (vulnerable)",
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ServerSession;

#[async_trait]
impl AuthScheme for ServerSession {
    async fn admit(&self, state: &AuthState, client: &str) -> Result<(), ApiError> {
        if state.lockouts().is_locked(client).await {
            info!(client, "login rejected, client is locked out");
            return Err(ApiError::RateLimited(LOCKED_MESSAGE.to_string()));
        }
        Ok(())
    }

    async fn reject(&self, state: &AuthState, client: &str, _reason: Rejection) -> ApiError {
        state.lockouts().record_failure(client).await;
        ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }

    async fn issue(
        &self,
        state: &AuthState,
        client: &str,
        username: &str,
    ) -> Result<Issued, ApiError> {
        state.lockouts().clear(client).await;
        let sid = state.sessions().create(username).await.map_err(|err| {
            error!("Failed to create session: {err}");
            ApiError::Internal(err.to_string())
        })?;
        let cookie = set_cookie(SECURE_COOKIE_NAME, &sid, true).map_err(|err| {
            error!("Failed to build session cookie: {err}");
            ApiError::Internal(err.to_string())
        })?;
        info!(username, "created server-side session");
        Ok(Issued {
            cookie,
            message: "Logged in (secure). HttpOnly session cookie set.",
        })
    }

    async fn revoke(&self, state: &AuthState, headers: &HeaderMap) -> Revoked {
        if let Some(sid) = extract_cookie(headers, SECURE_COOKIE_NAME) {
            if state.sessions().remove(&sid).await.is_some() {
                info!("session destroyed");
            }
        }
        // Always clear the cookie, even if the session record was missing.
        Revoked {
            cookie: clear_cookie(SECURE_COOKIE_NAME),
            message: "Logged out (secure)",
        }
    }
}

#[must_use]
pub fn auth_scheme(mode: Mode) -> &'static dyn AuthScheme {
    match mode {
        Mode::Vulnerable => &ForgeableCookie,
        Mode::Secure => &ServerSession,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[tokio::test]
    async fn forgeable_cookie_is_predictable_and_script_readable() {
        let state = AuthState::new();
        let issued = ForgeableCookie.issue(&state, "client", "alice").await.ok();
        let cookie = issued.map(|issued| issued.cookie);
        assert_eq!(
            cookie,
            Some(HeaderValue::from_static("session=alice-token; Path=/"))
        );
        assert!(state.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn forgeable_cookie_names_the_failing_part() {
        let state = AuthState::new();
        let err = ForgeableCookie
            .reject(&state, "client", Rejection::UnknownUser)
            .await;
        assert!(
            matches!(err, ApiError::Unauthorized(ref msg) if msg == "Username dosnt exist in database")
        );
    }

    #[tokio::test]
    async fn forgeable_cookie_never_locks_out() {
        let state = AuthState::new();
        for _ in 0..10 {
            let err = ForgeableCookie
                .reject(&state, "client", Rejection::WrongPassword)
                .await;
            assert!(matches!(err, ApiError::Unauthorized(ref msg) if msg == INCORRECT_PASSWORD));
        }
        assert!(ForgeableCookie.admit(&state, "client").await.is_ok());
        assert_eq!(state.lockouts().record("client").await, None);
    }

    #[tokio::test]
    async fn server_session_hides_failure_reason() {
        let state = AuthState::new();
        for reason in [Rejection::UnknownUser, Rejection::WrongPassword] {
            let err = ServerSession.reject(&state, "client", reason).await;
            assert!(matches!(err, ApiError::Unauthorized(ref msg) if msg == INVALID_CREDENTIALS));
        }
        assert_eq!(
            state.lockouts().record("client").await.map(|r| r.count),
            Some(2)
        );
    }

    #[tokio::test]
    async fn server_session_issue_clears_failures_and_stores_session() {
        let state = AuthState::new();
        state.lockouts().record_failure("client").await;
        let issued = ServerSession.issue(&state, "client", "alice").await;
        let Ok(issued) = issued else {
            panic!("issue failed");
        };
        assert_eq!(state.lockouts().record("client").await, None);
        assert_eq!(state.sessions().len().await, 1);

        let cookie = issued.cookie.to_str().unwrap_or_default().to_string();
        assert!(cookie.starts_with("sid="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn server_session_revoke_removes_named_session() {
        let state = AuthState::new();
        let Ok(issued) = ServerSession.issue(&state, "client", "alice").await else {
            panic!("issue failed");
        };
        let pair = issued
            .cookie
            .to_str()
            .unwrap_or_default()
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap_or(HeaderValue::from_static("")));
        let revoked = ServerSession.revoke(&state, &headers).await;
        assert_eq!(revoked.message, "Logged out (secure)");
        assert!(state.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn server_session_admit_honours_lockout() {
        let state = AuthState::new();
        for _ in 0..5 {
            state.lockouts().record_failure("client").await;
        }
        assert!(matches!(
            ServerSession.admit(&state, "client").await,
            Err(ApiError::RateLimited(_))
        ));
        assert!(ServerSession.admit(&state, "other").await.is_ok());
    }
}
