//! Database schema definitions

/// SQL to create the uid table
pub const CREATE_UID_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS uid (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    status BOOLEAN NOT NULL
)
"#;

/// SQL to create the record table
/// Every record belongs to an existing uid row
pub const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS axisgtd (
    todolist TEXT NOT NULL,
    config TEXT NOT NULL,
    time INTEGER NOT NULL,
    uid_name TEXT NOT NULL,
    CONSTRAINT fk_uid_name FOREIGN KEY (uid_name) REFERENCES uid(name)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_axisgtd_uid_time ON axisgtd(uid_name, time)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_UID_TABLE,
        CREATE_RECORDS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
