//! Database connection management.
//!
//! The event store persists through SeaORM; this module turns a
//! [`DatabaseConfig`] into a live connection pool.

pub mod config;
pub mod connection;

pub use config::{DatabaseConfig, redact_database_url};
pub use connection::connect;
