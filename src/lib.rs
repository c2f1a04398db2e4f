//! # Repograph - Polyglot code structure graph
//!
//! Parses a source repository written in any mix of languages and
//! materializes its structure as a property graph.
//!
//! Repograph provides:
//! - A closed set of supported languages with tree-sitter grammars
//! - Extension-based language dispatch with dialect splits (ts/tsx, ml/mli)
//! - Per-language symbol extraction (types, callables, module names)
//! - An idempotent SQLite-backed property graph (merge-by-identity)
//! - A bounded worker pool that parses files in parallel

pub mod config;
pub mod extract;
pub mod grammar;
pub mod ignore;
pub mod ingest;
pub mod language;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod ui;
pub mod walker;

// Re-exports for convenient access
pub use extract::Extractor;
pub use grammar::{FileParser, GrammarRegistry};
pub use ingest::{IngestSummary, Ingestor};
pub use language::Language;
pub use report::{ExtractionResult, FileMeta};
pub use store::GraphStore;

/// Result type alias for Repograph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Repograph operations.
///
/// Every variant is local to one file or one language; nothing here is
/// meant to abort a whole repository run except [`Error::Storage`] raised
/// while opening the graph store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Grammar for {language} failed to load: {cause}")]
    GrammarLoad { language: Language, cause: String },

    #[error("Parse failure in {path} ({language})")]
    Parse { path: String, language: Language },

    #[error("Extraction failure in {path}: {cause}")]
    Extraction { path: String, cause: String },

    #[error("Ingestion failed for {path} after {attempts} attempts: {cause}")]
    Ingest {
        path: String,
        attempts: u32,
        cause: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error for the run summary failure counters.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::UnsupportedLanguage(_) => FailureKind::UnsupportedLanguage,
            Error::GrammarLoad { .. } => FailureKind::GrammarLoad,
            Error::Parse { .. } => FailureKind::Parse,
            Error::Extraction { .. } => FailureKind::Extraction,
            Error::Ingest { .. } | Error::Storage(_) => FailureKind::Ingest,
            Error::Io(_) => FailureKind::Io,
        }
    }
}

/// Failure categories reported in the final run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    UnsupportedLanguage,
    GrammarLoad,
    Parse,
    Extraction,
    Ingest,
    Io,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedLanguage => "unsupported-language",
            FailureKind::GrammarLoad => "grammar-load",
            FailureKind::Parse => "parse",
            FailureKind::Extraction => "extraction",
            FailureKind::Ingest => "ingest",
            FailureKind::Io => "io",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
