//! Local photo store for an AR photo viewer.
//!
//! This crate owns the embedded SQLite database behind the app: photos and
//! their metadata, tags, AR sessions and render relationships, an
//! append-only activity log, and seeded users/configuration. Image bytes
//! are never touched here; photos are stored as opaque URI references.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use db::Database;
pub use error::{DbError, DbResult};
