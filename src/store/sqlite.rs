//! SQLite implementation of the property-graph store
//!
//! The wire contract is a small fixed set of idempotent merge operations:
//! create-repository, upsert-file, upsert-definition and the two
//! ensure-edge operations. Each is atomic per entity; the ingestor wraps a
//! file's mutation set in one transaction for all-or-nothing application.

use super::schema;
use crate::report::ExtractionResult;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::str::FromStr;

/// The two definition node kinds in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// Class, struct, interface, enum - a type-like definition
    Type,
    /// Function, method, constructor - a callable definition
    Callable,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Type => "type",
            DefinitionKind::Callable => "callable",
        }
    }
}

impl FromStr for DefinitionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "type" | "class" => Ok(DefinitionKind::Type),
            "callable" | "function" => Ok(DefinitionKind::Callable),
            _ => Err(Error::Extraction {
                path: String::new(),
                cause: format!("unknown definition kind: {}", s),
            }),
        }
    }
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SQLite-backed property-graph store
pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Open a database file (creates if it doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create tables, uniqueness constraints and indexes up front
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Transactions ==========

    pub fn begin_transaction(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    pub fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    // ========== Node upserts ==========

    /// Create-or-fetch a repository by name.
    ///
    /// Re-running ingestion against the same repository name reuses the
    /// existing node (and its original creation timestamp) rather than
    /// accumulating a new node per run.
    pub fn create_repository(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO repositories (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            [name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM repositories WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Upsert a file node by its unique path key.
    ///
    /// Creates the node if absent; otherwise updates its attributes in
    /// place and refreshes the ingestion timestamp.
    pub fn upsert_file(&self, result: &ExtractionResult) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO files (path, name, module_name, language, line_count)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(path) DO UPDATE SET
                name = excluded.name,
                module_name = excluded.module_name,
                language = excluded.language,
                line_count = excluded.line_count,
                ingested_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            "#,
            params![
                result.meta.path,
                result.meta.name,
                result.module_name,
                result.meta.language.as_str(),
                result.meta.line_count,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM files WHERE path = ?1",
            [&result.meta.path],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Upsert a definition node by its (kind, name) identity key.
    ///
    /// Identity is global: the same name in two files (or two
    /// repositories) merges onto one node with multiple DEFINES edges.
    pub fn upsert_definition(&self, kind: DefinitionKind, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO definitions (kind, name) VALUES (?1, ?2) ON CONFLICT(kind, name) DO NOTHING",
            params![kind.as_str(), name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM definitions WHERE kind = ?1 AND name = ?2",
            params![kind.as_str(), name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // ========== Edge upserts ==========

    /// Ensure a CONTAINS edge from a repository to a file
    pub fn ensure_contains(&self, repository_id: i64, file_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO contains_edges (repository_id, file_id) VALUES (?1, ?2)",
            params![repository_id, file_id],
        )?;
        Ok(())
    }

    /// Ensure a DEFINES edge from a file to a definition
    pub fn ensure_defines(&self, file_id: i64, definition_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO defines_edges (file_id, definition_id) VALUES (?1, ?2)",
            params![file_id, definition_id],
        )?;
        Ok(())
    }

    // ========== Queries ==========

    /// Look up a file node id by path
    pub fn file_id(&self, path: &str) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT id FROM files WHERE path = ?1", [path], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    /// All (kind, name) definitions linked to a file, sorted
    pub fn definitions_for_file(&self, path: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT d.kind, d.name FROM definitions d
            JOIN defines_edges e ON e.definition_id = d.id
            JOIN files f ON f.id = e.file_id
            WHERE f.path = ?1
            ORDER BY d.kind, d.name
            "#,
        )?;
        let rows = stmt
            .query_map([path], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of DEFINES edges pointing at one definition
    pub fn defines_edge_count(&self, kind: DefinitionKind, name: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM defines_edges e
            JOIN definitions d ON d.id = e.definition_id
            WHERE d.kind = ?1 AND d.name = ?2
            "#,
            params![kind.as_str(), name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_repositories(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM repositories")
    }

    pub fn count_files(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM files")
    }

    pub fn count_definitions(&self, kind: DefinitionKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM definitions WHERE kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn count_contains_edges(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM contains_edges")
    }

    pub fn count_defines_edges(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM defines_edges")
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Snapshot of graph-wide counts
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            repositories: self.count_repositories()?,
            files: self.count_files()?,
            types: self.count_definitions(DefinitionKind::Type)?,
            callables: self.count_definitions(DefinitionKind::Callable)?,
            contains_edges: self.count_contains_edges()?,
            defines_edges: self.count_defines_edges()?,
        })
    }
}

/// Node and edge counts for the whole graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub repositories: usize,
    pub files: usize,
    pub types: usize,
    pub callables: usize,
    pub contains_edges: usize,
    pub defines_edges: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph statistics:")?;
        writeln!(f, "  Repositories: {}", self.repositories)?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Types: {}", self.types)?;
        writeln!(f, "  Callables: {}", self.callables)?;
        writeln!(
            f,
            "  Edges: {} contains, {} defines",
            self.contains_edges, self.defines_edges
        )
    }
}
