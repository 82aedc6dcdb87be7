//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - uid(id, name, status)
//! - axisgtd(todolist, config, time, uid_name -> uid.name)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SyncStore, DbStats};
