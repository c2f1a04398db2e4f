//! Normalized extraction results
//!
//! The handoff value between the extractor and the graph ingestor: one
//! [`ExtractionResult`] per file, owned by the pipeline for exactly the
//! duration of that file's processing.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metadata about one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    /// Path relative to the repository root (unique key in the graph)
    pub path: String,
    /// Base file name, for display
    pub name: String,
    /// Resolved language
    pub language: Language,
    /// Number of lines in the file
    pub line_count: u32,
}

impl FileMeta {
    pub fn new(path: impl Into<String>, language: Language, line_count: u32) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            language,
            line_count,
        }
    }

    /// Default module name: the base file name without its extension.
    pub fn default_module_name(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => self.name.clone(),
        }
    }
}

/// Normalized symbols extracted from one file.
///
/// Name sets are `BTreeSet`s: duplicates within a file collapse and
/// iteration order is stable, which keeps ingestion deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub meta: FileMeta,
    /// Declared module/package name (file stem unless the language has an
    /// explicit declaration construct)
    pub module_name: String,
    /// Names of type definitions (classes, structs, interfaces, ...)
    pub type_names: BTreeSet<String>,
    /// Names of callable definitions (functions, methods, ...)
    pub callable_names: BTreeSet<String>,
}

impl ExtractionResult {
    /// Create an empty result for a file. No definitions is a valid state.
    pub fn empty(meta: FileMeta) -> Self {
        let module_name = meta.default_module_name();
        Self {
            meta,
            module_name,
            type_names: BTreeSet::new(),
            callable_names: BTreeSet::new(),
        }
    }

    /// Total number of extracted definitions
    pub fn definition_count(&self) -> usize {
        self.type_names.len() + self.callable_names.len()
    }
}
