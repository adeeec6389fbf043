use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::api::handlers::config::truthy;

/// Login body. Fields are kept as raw JSON so a mistyped field reaches the
/// credential check instead of failing the whole body.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub username: Value,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub password: Value,
}

impl LoginRequest {
    /// The username to look up, or `None` when it is missing or falsy.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        if !truthy(&self.username) {
            return None;
        }
        match &self.username {
            Value::String(username) => Some(username.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The password, when it was sent as a string. Anything else never matches.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_str()
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct AuthResponse {
    pub ok: bool,
    pub message: String,
}
