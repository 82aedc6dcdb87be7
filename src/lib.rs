//! # AxisGTD Sync - Synchronization store for todo lists
//!
//! Clients push and pull a "todo list + config" snapshot under a short,
//! randomly allocated identifier (a UID). Each UID carries an enable flag;
//! records of a disabled UID stay on disk but are hidden from reads.
//!
//! AxisGTD Sync provides:
//! - Collision-free allocation of short hex identifiers with bounded retry
//! - SQLite-backed storage of identifiers and their timestamped records
//! - Atomic cascading delete of an identifier and everything it owns
//! - TOML configuration for the database location and allocation parameters

pub mod uid;
pub mod record;
pub mod storage;
pub mod config;

// Re-exports for convenient access
pub use uid::{NameAllocator, NameSource, RandomHex, Uid, UidSummary};
pub use record::{Record, Snapshot};
pub use storage::SyncStore;

/// Result type alias for AxisGTD Sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for AxisGTD Sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UID not found: {0}")]
    UidNotFound(String),

    #[error("UID is disabled: {0}")]
    UidDisabled(String),

    #[error("No record found for UID {uid_name} at time {time}")]
    RecordNotFound { uid_name: String, time: i64 },

    #[error("No free identifier of length {length} after {attempts} attempts")]
    NamespaceExhausted { attempts: u32, length: usize },

    #[error("Entropy source failed: {0}")]
    Entropy(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for every error a client would see as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UidNotFound(_) | Error::UidDisabled(_) | Error::RecordNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::UidNotFound("abcde".into()).is_not_found());
        assert!(Error::UidDisabled("abcde".into()).is_not_found());
        assert!(Error::RecordNotFound { uid_name: "abcde".into(), time: 1 }.is_not_found());
        assert!(!Error::NamespaceExhausted { attempts: 3, length: 5 }.is_not_found());
        assert!(!Error::Entropy("no rng".into()).is_not_found());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::RecordNotFound { uid_name: "a1b2c".into(), time: 1000 };
        assert_eq!(err.to_string(), "No record found for UID a1b2c at time 1000");

        let err = Error::NamespaceExhausted { attempts: 32, length: 5 };
        assert_eq!(err.to_string(), "No free identifier of length 5 after 32 attempts");
    }
}
