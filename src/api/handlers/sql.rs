//! User lookup endpoint, in an injectable and a parameterized flavour.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::{IntoParams, ToSchema};

use super::{
    config::{LabConfig, Mode},
    storage::{CredentialStore, UserQuery, UserRow},
};

const LOOKUP_SELECT: &str = "SELECT id, username, email, balance FROM users";
const LOOKUP_BOUND: &str = "SELECT id, username, email, balance FROM users WHERE username = $1";

/// Turns a search term into a runnable lookup.
pub trait UserQueryBuilder: Send + Sync {
    fn build(&self, term: &str) -> UserQuery;
}

/// Splices the term into the SQL text. Quotes, comments and boolean operators
/// in the term change the statement; nothing is escaped.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterpolatedQuery;

impl UserQueryBuilder for InterpolatedQuery {
    fn build(&self, term: &str) -> UserQuery {
        UserQuery::Raw(format!("{LOOKUP_SELECT} WHERE username = '{term}'"))
    }
}

/// Binds the term as `$1`; it is only ever compared as a literal.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParameterizedQuery;

impl UserQueryBuilder for ParameterizedQuery {
    fn build(&self, term: &str) -> UserQuery {
        UserQuery::Bound {
            sql: LOOKUP_BOUND,
            param: term.to_string(),
        }
    }
}

#[must_use]
pub fn query_builder(mode: Mode) -> &'static dyn UserQueryBuilder {
    match mode {
        Mode::Vulnerable => &InterpolatedQuery,
        Mode::Secure => &ParameterizedQuery,
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct SqlParams {
    /// Username to look up
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SqlRows {
    rows: Vec<UserRow>,
}

#[utoipa::path(
    get,
    path = "/api/sql",
    params(SqlParams),
    responses(
        (status = 200, description = "Matching users", body = SqlRows),
        (status = 500, description = "Database error, message included")
    ),
    tag = "sql"
)]
#[instrument(skip(config, store))]
pub async fn sql(
    config: Extension<Arc<LabConfig>>,
    store: Extension<Arc<dyn CredentialStore>>,
    params: Option<Query<SqlParams>>,
) -> Response {
    let term = params
        .and_then(|Query(params)| params.q)
        .unwrap_or_default();
    let mode = config.sql_mode();
    let query = query_builder(mode).build(&term);

    match store.search(&query).await {
        Ok(rows) => (StatusCode::OK, Json(SqlRows { rows })).into_response(),
        Err(err) => {
            error!(mode = mode.as_str(), "User lookup failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "err": err.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolated_query_keeps_the_term_verbatim() {
        let query = InterpolatedQuery.build("' OR '1'='1");
        assert_eq!(
            query,
            UserQuery::Raw(
                "SELECT id, username, email, balance FROM users WHERE username = '' OR '1'='1'"
                    .to_string()
            )
        );
    }

    #[test]
    fn interpolated_query_passes_comments_through() {
        let query = InterpolatedQuery.build("alice'--");
        assert!(query.sql().ends_with("username = 'alice'--'"));
    }

    #[test]
    fn parameterized_query_never_touches_the_sql_text() {
        let query = ParameterizedQuery.build("' OR '1'='1");
        assert_eq!(query.sql(), LOOKUP_BOUND);
        assert_eq!(
            query,
            UserQuery::Bound {
                sql: LOOKUP_BOUND,
                param: "' OR '1'='1".to_string(),
            }
        );
    }

    #[test]
    fn builder_follows_mode() {
        assert!(matches!(
            query_builder(Mode::Vulnerable).build("x"),
            UserQuery::Raw(_)
        ));
        assert!(matches!(
            query_builder(Mode::Secure).build("x"),
            UserQuery::Bound { .. }
        ));
    }
}
