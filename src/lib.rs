//! # Ranjivi (vulnerable-by-toggle teaching server)
//!
//! `ranjivi` serves a small JSON API that flips between intentionally
//! vulnerable and secure implementations of two classic web flaws.
//!
//! ## SQL injection
//!
//! `GET /api/sql?q=` looks a user up by username. With `sql_injection_enabled`
//! the search term is spliced into the SQL text verbatim; otherwise it is bound
//! as a query parameter.
//!
//! ## Broken authentication
//!
//! `POST /api/login` either hands out a forgeable `session=<username>-token`
//! cookie readable by page scripts (`broken_auth_enabled`), or creates a random
//! server-side session behind an `HttpOnly` `sid` cookie, guarded by a
//! per-client brute-force lockout (5 failures in 15 minutes locks for 15
//! minutes).
//!
//! Both flags live in process memory and reset on restart.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
