//! `OpenAPI` document for every route served by the API.

use utoipa::OpenApi;

use super::handlers::{auth, config, health, root, sql, storage};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ranjivi",
        description = "Toggleable SQL injection and broken authentication lab"
    ),
    paths(
        root::root,
        health::health,
        config::get_config,
        config::set_config,
        sql::sql,
        auth::login::login,
        auth::logout::logout,
    ),
    components(schemas(
        config::ConfigSnapshot,
        config::ConfigUpdate,
        sql::SqlRows,
        storage::UserRow,
        auth::types::LoginRequest,
        auth::types::AuthResponse,
        health::Health,
    )),
    tags(
        (name = "config", description = "Vulnerability toggles"),
        (name = "sql", description = "User lookup"),
        (name = "auth", description = "Login and logout"),
        (name = "health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = openapi();
        for path in [
            "/",
            "/health",
            "/api/config",
            "/api/sql",
            "/api/login",
            "/api/logout",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path {path} in OpenAPI document"
            );
        }
    }
}
