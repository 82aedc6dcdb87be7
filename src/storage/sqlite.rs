//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use crate::{Result, Error};
use crate::record::{Record, Snapshot};
use crate::uid::{NameAllocator, Uid, UidSummary};
use super::schema;

/// SQLite-backed storage for UIDs and their sync records
pub struct SyncStore {
    conn: Connection,
    allocator: NameAllocator,
}

impl SyncStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        tracing::info!("Opened sync store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn,
            allocator: NameAllocator::default(),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Replace the allocator used by [`SyncStore::create_uid`]
    pub fn with_allocator(mut self, allocator: NameAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        // SQLite only enforces foreign keys when asked to, per connection
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== UID Operations ==========

    /// Allocate a fresh name and store it as an enabled UID.
    ///
    /// The existence checks and the insert share one write transaction, so a
    /// concurrent writer cannot claim the name in between.
    pub fn create_uid(&mut self) -> Result<Uid> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let name = self.allocator.allocate(|candidate| name_exists(&tx, candidate))?;

        tx.execute(
            "INSERT INTO uid (name, status) VALUES (?1, ?2)",
            params![name, true],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!("Created UID {}", name);
        Ok(Uid { id, name, status: true })
    }

    /// Get a UID by name
    pub fn get_uid(&self, name: &str) -> Result<Option<Uid>> {
        self.conn
            .query_row(
                "SELECT id, name, status FROM uid WHERE name = ?1",
                [name],
                |row| {
                    Ok(Uid {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        status: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Check whether a UID with this name exists
    pub fn uid_exists(&self, name: &str) -> Result<bool> {
        name_exists(&self.conn, name)
    }

    /// List every UID with the number of records it owns, oldest first
    pub fn list_uids(&self) -> Result<Vec<UidSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT uid.name, uid.status, COUNT(axisgtd.uid_name)
            FROM uid
            LEFT JOIN axisgtd ON uid.name = axisgtd.uid_name
            GROUP BY uid.id, uid.name, uid.status
            ORDER BY uid.id
            "#,
        )?;

        let summaries = stmt
            .query_map([], |row| {
                let count: i64 = row.get(2)?;
                Ok(UidSummary {
                    name: row.get(0)?,
                    status: row.get(1)?,
                    count: count as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(summaries)
    }

    /// Flip the status of a UID and return the new value
    pub fn toggle_status(&self, name: &str) -> Result<bool> {
        let status: Option<bool> = self
            .conn
            .query_row(
                "UPDATE uid SET status = NOT status WHERE name = ?1 RETURNING status",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or_else(|| Error::UidNotFound(name.to_string()))?;
        tracing::info!("UID {} is now {}", name, if status { "enabled" } else { "disabled" });
        Ok(status)
    }

    /// Delete a UID together with all of its records.
    ///
    /// Runs in one transaction: if the UID row is missing or any statement
    /// fails, nothing is removed. Returns the number of records deleted.
    pub fn delete_uid(&mut self, name: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let records = tx.execute("DELETE FROM axisgtd WHERE uid_name = ?1", [name])?;
        let removed = tx.execute("DELETE FROM uid WHERE name = ?1", [name])?;
        if removed == 0 {
            // Dropping the transaction rolls it back
            return Err(Error::UidNotFound(name.to_string()));
        }

        tx.commit()?;
        tracing::info!("Deleted UID {} and {} record(s)", name, records);
        Ok(records)
    }

    /// Count all UIDs
    pub fn count_uids(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM uid", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Record Operations ==========

    /// Store a snapshot under an enabled UID
    pub fn push_record(&self, uid_name: &str, snapshot: &Snapshot) -> Result<Record> {
        let status: Option<bool> = self
            .conn
            .query_row("SELECT status FROM uid WHERE name = ?1", [uid_name], |row| row.get(0))
            .optional()?;

        match status {
            None => return Err(Error::UidNotFound(uid_name.to_string())),
            Some(false) => return Err(Error::UidDisabled(uid_name.to_string())),
            Some(true) => {}
        }

        self.conn.execute(
            r#"
            INSERT INTO axisgtd (todolist, config, time, uid_name)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![snapshot.todolist, snapshot.config, snapshot.time, uid_name],
        )?;

        tracing::debug!("Stored record for {} at time {}", uid_name, snapshot.time);
        Ok(Record::from_snapshot(uid_name, snapshot))
    }

    /// Get the newest visible record of a UID.
    ///
    /// Returns `None` when the UID is missing, disabled, or has no records.
    /// Records sharing the highest time resolve to the one inserted last.
    pub fn latest_record(&self, uid_name: &str) -> Result<Option<Record>> {
        self.conn
            .query_row(
                r#"
                SELECT axisgtd.uid_name, axisgtd.todolist, axisgtd.config, axisgtd.time
                FROM axisgtd
                JOIN uid ON axisgtd.uid_name = uid.name
                WHERE uid.name = ?1 AND uid.status
                ORDER BY axisgtd.time DESC, axisgtd.rowid DESC
                LIMIT 1
                "#,
                [uid_name],
                |row| self.row_to_record(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// List the visible records of a UID, oldest first
    pub fn list_records(&self, uid_name: &str) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT axisgtd.uid_name, axisgtd.todolist, axisgtd.config, axisgtd.time
            FROM axisgtd
            JOIN uid ON axisgtd.uid_name = uid.name
            WHERE uid.name = ?1 AND uid.status
            ORDER BY axisgtd.time ASC, axisgtd.rowid ASC
            "#,
        )?;

        let records = stmt
            .query_map([uid_name], |row| self.row_to_record(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Delete one record identified by UID name and time.
    ///
    /// If several records share the pair, only the newest insert is removed.
    pub fn delete_record(&self, uid_name: &str, time: i64) -> Result<()> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM axisgtd
            WHERE rowid = (
                SELECT rowid FROM axisgtd
                WHERE uid_name = ?1 AND time = ?2
                ORDER BY rowid DESC
                LIMIT 1
            )
            "#,
            params![uid_name, time],
        )?;

        if affected == 0 {
            return Err(Error::RecordNotFound {
                uid_name: uid_name.to_string(),
                time,
            });
        }

        tracing::debug!("Deleted record for {} at time {}", uid_name, time);
        Ok(())
    }

    /// Count all records, including those of disabled UIDs
    pub fn count_records(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM axisgtd", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to a Record
    fn row_to_record(&self, row: &rusqlite::Row) -> rusqlite::Result<Record> {
        Ok(Record {
            uid_name: row.get(0)?,
            todolist: row.get(1)?,
            config: row.get(2)?,
            time: row.get(3)?,
        })
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let enabled: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM uid WHERE status",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            uids: self.count_uids()?,
            enabled_uids: enabled as usize,
            records: self.count_records()?,
        })
    }
}

fn name_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM uid WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    pub uids: usize,
    pub enabled_uids: usize,
    pub records: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  UIDs: {} ({} enabled)", self.uids, self.enabled_uids)?;
        writeln!(f, "  Records: {}", self.records)
    }
}
