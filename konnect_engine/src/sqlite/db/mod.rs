//! # SQLite database methods
//!
//! "Low-level" SQLite interactions, maintained as simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers obtain a connection from a pool, or open an atomic transaction as
//! the need arises, and call through without any other changes — the settlement commit composes
//! [`payments::settle_if_pending`] and [`deals::mark_in_progress`] inside one transaction this way.
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod deals;
pub mod payments;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
