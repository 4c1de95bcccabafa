//! Diesel ORM runtime infrastructure
//!
//! Connection pooling plus the diesel-backed implementations of the
//! directory, message log store and diagnostic sink.
//!
//! # Features
//!
//! - `postgres` (default): PostgreSQL backend
//! - `mysql`: MySQL/MariaDB backend

pub mod database;
pub mod models;
pub mod schema;
pub mod store;

// Re-export key types
pub use database::{Database, DatabaseConfig, DbConnection, Pool, PooledConnection};
pub use store::{DatabaseDiagnostics, DieselDirectory, DieselMessageLog};
