//! Database schema definitions
//!
//! Uniqueness constraints are the backbone of idempotent ingestion:
//! repository names, file paths and (kind, name) definition identities are
//! all unique, and both edge tables deduplicate at the edge level.

/// SQL to create the repositories table
pub const CREATE_REPOSITORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the files table
pub const CREATE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    module_name TEXT NOT NULL,
    language TEXT NOT NULL,
    line_count INTEGER NOT NULL,
    ingested_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create the definitions table (types and callables)
pub const CREATE_DEFINITIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    UNIQUE(kind, name)
)
"#;

/// SQL to create the CONTAINS edge table (repository → file)
pub const CREATE_CONTAINS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS contains_edges (
    repository_id INTEGER NOT NULL REFERENCES repositories(id),
    file_id INTEGER NOT NULL REFERENCES files(id),
    UNIQUE(repository_id, file_id)
)
"#;

/// SQL to create the DEFINES edge table (file → definition)
pub const CREATE_DEFINES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS defines_edges (
    file_id INTEGER NOT NULL REFERENCES files(id),
    definition_id INTEGER NOT NULL REFERENCES definitions(id),
    UNIQUE(file_id, definition_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_files_name ON files(name)",
    "CREATE INDEX IF NOT EXISTS idx_files_language ON files(language)",
    "CREATE INDEX IF NOT EXISTS idx_definitions_name ON definitions(name)",
    "CREATE INDEX IF NOT EXISTS idx_contains_file ON contains_edges(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_defines_definition ON defines_edges(definition_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_REPOSITORIES_TABLE,
        CREATE_FILES_TABLE,
        CREATE_DEFINITIONS_TABLE,
        CREATE_CONTAINS_TABLE,
        CREATE_DEFINES_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
