//! Session table and cookie helpers.

use anyhow::{Context, Result};
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::{rngs::OsRng, RngCore};
use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::Mutex;

/// Cookie holding the forgeable `<username>-token` value.
pub const VULNERABLE_COOKIE_NAME: &str = "session";
/// Cookie holding the random server-side session id.
pub const SECURE_COOKIE_NAME: &str = "sid";

const SESSION_ID_BYTES: usize = 24;

/// Characters left as-is in cookie values, the same set `encodeURIComponent` keeps.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub username: String,
    pub created_at_unix: u64,
}

/// Server-side sessions, in memory only. Entries never expire on their own.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `username` and return its id.
    ///
    /// # Errors
    /// Returns an error if the OS random generator fails.
    pub async fn create(&self, username: &str) -> Result<String> {
        let sid = generate_session_id()?;
        let record = SessionRecord {
            username: username.to_string(),
            created_at_unix: now_unix_seconds(),
        };
        self.sessions.lock().await.insert(sid.clone(), record);
        Ok(sid)
    }

    pub async fn get(&self, sid: &str) -> Option<SessionRecord> {
        self.sessions.lock().await.get(sid).cloned()
    }

    pub async fn remove(&self, sid: &str) -> Option<SessionRecord> {
        self.sessions.lock().await.remove(sid)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

/// 24 bytes from the OS generator, hex encoded (48 characters).
pub(crate) fn generate_session_id() -> Result<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(hex::encode(bytes))
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Read a named cookie from the request headers.
pub(crate) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == name {
                return Some(percent_decode_str(val.trim()).decode_utf8_lossy().into_owned());
            }
        }
    }
    None
}

/// Build a `Set-Cookie` value; `http_only` decides whether page scripts can read it.
///
/// The value is percent-encoded, so `;`, spaces and control characters cannot
/// end the pair early or add attributes.
pub(crate) fn set_cookie(
    name: &str,
    value: &str,
    http_only: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let value = utf8_percent_encode(value, COOKIE_VALUE);
    let mut cookie = format!("{name}={value}; Path=/");
    if http_only {
        cookie.push_str("; HttpOnly; SameSite=Lax");
    }
    HeaderValue::from_str(&cookie)
}

/// Build a `Set-Cookie` value that expires the named cookie.
pub(crate) fn clear_cookie(name: &str) -> HeaderValue {
    // Cookie names are compile-time constants made of token characters.
    HeaderValue::from_str(&format!("{name}=; Path=/; Max-Age=0"))
        .unwrap_or_else(|_| HeaderValue::from_static("invalid=; Path=/; Max-Age=0"))
}
