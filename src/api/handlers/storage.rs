//! Access to the `users` table.
//!
//! Handlers never touch the pool directly; they go through `CredentialStore`
//! so the HTTP surface can be exercised against an in-memory store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, FromRow, PgPool};
use tracing::{debug, info_span, Instrument};
use utoipa::ToSchema;

/// Columns returned to callers of the lookup endpoint.
#[derive(ToSchema, Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub balance: Option<f64>,
}

/// Stored credentials for a single user.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: i32,
    pub username: String,
    pub password: String,
}

/// A user lookup ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    /// Complete SQL text, sent as-is over the simple query protocol.
    Raw(String),
    /// Prepared statement with one bound text parameter.
    Bound { sql: &'static str, param: String },
}

impl UserQuery {
    #[must_use]
    pub fn sql(&self) -> &str {
        match self {
            Self::Raw(sql) => sql,
            Self::Bound { sql, .. } => sql,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // Prefer the server's own message, e.g. `syntax error at or near "x"`.
        match err {
            sqlx::Error::Database(db_err) => Self::Database(db_err.message().to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

const CREDENTIALS_QUERY: &str = "SELECT id, username, password FROM users WHERE username = $1";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Run a user lookup and return every matching row.
    async fn search(&self, query: &UserQuery) -> Result<Vec<UserRow>, StoreError>;

    /// Fetch the credentials for an exact username.
    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Send `sql` over the simple query protocol, so stacked statements run too.
///
/// The pool hands out a connection for the call and takes it back afterwards.
async fn run_raw(pool: &PgPool, sql: &str) -> Result<Vec<UserRow>, StoreError> {
    let raw_rows = sqlx::raw_sql(sql).fetch_all(pool).await?;
    let rows = raw_rows
        .iter()
        .map(UserRow::from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn search(&self, query: &UserQuery) -> Result<Vec<UserRow>, StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );
        debug!(sql = query.sql(), "running user lookup");

        let rows = match query {
            UserQuery::Raw(sql) => run_raw(&self.pool, sql).instrument(span).await?,
            UserQuery::Bound { sql, param } => {
                let acquire_span = info_span!(
                    "db.acquire",
                    db.system = "postgresql",
                    db.operation = "ACQUIRE"
                );
                // The connection goes back to the pool when `conn` drops, on every path.
                let mut conn = self.pool.acquire().instrument(acquire_span).await?;
                sqlx::query_as::<_, UserRow>(sql)
                    .bind(param)
                    .fetch_all(&mut *conn)
                    .instrument(span)
                    .await?
            }
        };

        Ok(rows)
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT"
        );
        let credentials = sqlx::query_as::<_, Credentials>(CREDENTIALS_QUERY)
            .bind(username)
            .fetch_optional(&mut *conn)
            .instrument(span)
            .await?;
        Ok(credentials)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        let span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(span).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_query_exposes_sql_text() {
        let raw = UserQuery::Raw("SELECT 1".to_string());
        assert_eq!(raw.sql(), "SELECT 1");
        let bound = UserQuery::Bound {
            sql: CREDENTIALS_QUERY,
            param: "alice".to_string(),
        };
        assert_eq!(bound.sql(), CREDENTIALS_QUERY);
    }

    #[test]
    fn non_database_errors_keep_their_display() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(
            err,
            StoreError::Database(sqlx::Error::PoolTimedOut.to_string())
        );
    }
}
