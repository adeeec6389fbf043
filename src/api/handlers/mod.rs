//! API handlers and the in-memory state they share.

pub mod auth;
pub mod config;
pub mod health;
pub mod root;
pub mod sql;
pub mod storage;
