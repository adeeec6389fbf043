//! Process-wide lab configuration and its endpoints.
//!
//! Two independent flags pick the vulnerable or secure code path for SQL
//! lookups and for authentication. Flags are shared by every caller and reset
//! on restart.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::api::error::ApiError;

pub const SQL_INJECTION_ENABLED: &str = "sql_injection_enabled";
pub const BROKEN_AUTH_ENABLED: &str = "broken_auth_enabled";

/// Which implementation of a concern handles the current request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Vulnerable,
    Secure,
}

impl Mode {
    #[must_use]
    pub const fn from_flag(vulnerable: bool) -> Self {
        if vulnerable {
            Self::Vulnerable
        } else {
            Self::Secure
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vulnerable => "vulnerable",
            Self::Secure => "secure",
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub sql_injection_enabled: bool,
    pub broken_auth_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown config key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Default)]
pub struct LabConfig {
    sql_injection_enabled: AtomicBool,
    broken_auth_enabled: AtomicBool,
}

impl LabConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            sql_injection_enabled: self.sql_injection_enabled.load(Ordering::Relaxed),
            broken_auth_enabled: self.broken_auth_enabled.load(Ordering::Relaxed),
        }
    }

    /// Overwrite one flag for every subsequent request.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidKey` when `key` names no flag; nothing is changed.
    pub fn set(&self, key: &str, value: bool) -> Result<ConfigSnapshot, ConfigError> {
        let flag = match key {
            SQL_INJECTION_ENABLED => &self.sql_injection_enabled,
            BROKEN_AUTH_ENABLED => &self.broken_auth_enabled,
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        };
        flag.store(value, Ordering::Relaxed);
        Ok(self.get())
    }

    #[must_use]
    pub fn sql_mode(&self) -> Mode {
        Mode::from_flag(self.sql_injection_enabled.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn auth_mode(&self) -> Mode {
        Mode::from_flag(self.broken_auth_enabled.load(Ordering::Relaxed))
    }
}

/// Loose truthiness for toggle values sent by the browser UI.
///
/// `null`, `false`, `0`, `NaN` and `""` are false, everything else is true.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: Value,
}

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Current toggles", body = ConfigSnapshot)
    ),
    tag = "config"
)]
pub async fn get_config(config: Extension<Arc<LabConfig>>) -> impl IntoResponse {
    Json(config.get())
}

#[utoipa::path(
    post,
    path = "/api/config",
    request_body = ConfigUpdate,
    responses(
        (status = 200, description = "Toggle updated"),
        (status = 400, description = "Unknown config key")
    ),
    tag = "config"
)]
#[instrument(skip(config))]
pub async fn set_config(
    config: Extension<Arc<LabConfig>>,
    payload: Option<Json<ConfigUpdate>>,
) -> Result<impl IntoResponse, ApiError> {
    let update = payload.map(|Json(update)| update).unwrap_or_default();
    let key = update.key.unwrap_or_default();
    let value = truthy(&update.value);

    let snapshot = config
        .set(&key, value)
        .map_err(|_| ApiError::InvalidInput("Unknown config".to_string()))?;

    info!(key = %key, value, "config updated");

    Ok((StatusCode::OK, Json(json!({ "ok": true, "config": snapshot }))))
}
