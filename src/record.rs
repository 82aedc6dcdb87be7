//! Sync records - timestamped todo list snapshots
//!
//! A [`Snapshot`] is what a client pushes: the serialized todo list, its
//! configuration, and a client-chosen logical timestamp. Once stored under a
//! UID it becomes a [`Record`].

use serde::{Deserialize, Serialize};

/// Client-supplied payload of a sync push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub todolist: String,
    pub config: String,
    /// Logical timestamp chosen by the client; newest wins on pull
    pub time: i64,
}

impl Snapshot {
    pub fn new(todolist: impl Into<String>, config: impl Into<String>, time: i64) -> Self {
        Self {
            todolist: todolist.into(),
            config: config.into(),
            time,
        }
    }
}

/// A snapshot stored under a UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Owning UID name
    pub uid_name: String,
    pub todolist: String,
    pub config: String,
    pub time: i64,
}

impl Record {
    /// Bind a snapshot to its owning UID
    pub fn from_snapshot(uid_name: impl Into<String>, snapshot: &Snapshot) -> Self {
        Self {
            uid_name: uid_name.into(),
            todolist: snapshot.todolist.clone(),
            config: snapshot.config.clone(),
            time: snapshot.time,
        }
    }

    /// The client-visible part of the record
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.todolist.clone(), self.config.clone(), self.time)
    }
}
