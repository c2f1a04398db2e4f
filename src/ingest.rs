//! Graph ingestion
//!
//! Converts extraction results into graph mutations under a
//! merge-by-identity discipline. Every write is an upsert, so retrying a
//! failed file is always safe, and applying two files' mutations in either
//! order yields the same final graph.

use crate::report::ExtractionResult;
use crate::store::{DefinitionKind, GraphStore};
use crate::{Error, Result};
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Outcome of ingesting one batch of extraction results
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Files whose mutations were committed
    pub files_ingested: usize,
    /// Total definitions linked (types + callables, per file)
    pub definitions_linked: usize,
    /// Per-file failures after retry exhaustion: (path, cause)
    pub failures: Vec<(String, String)>,
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ingested {} files ({} definitions linked, {} failed)",
            self.files_ingested,
            self.definitions_linked,
            self.failures.len()
        )
    }
}

/// Writes extraction results into the property graph.
///
/// Owns the mapping from normalized results to graph mutations; nothing
/// else touches the persisted graph. Holds no graph state of its own
/// between calls.
pub struct Ingestor<'a> {
    store: &'a GraphStore,
    max_attempts: u32,
    backoff: Duration,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Override the retry policy (mainly for tests)
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    /// Ingest a batch of extraction results into one repository.
    ///
    /// The repository node is created-or-fetched by name; a failure here is
    /// fatal (no ingestion is possible at all). Per-file failures are
    /// retried with backoff and, once exhausted, recorded in the summary
    /// without aborting the rest of the batch.
    pub fn ingest(
        &self,
        repository: &str,
        results: impl IntoIterator<Item = ExtractionResult>,
    ) -> Result<IngestSummary> {
        let repository_id = self.store.create_repository(repository)?;
        let mut summary = IngestSummary::default();

        for result in results {
            match self.ingest_file(repository_id, &result) {
                Ok(()) => {
                    summary.files_ingested += 1;
                    summary.definitions_linked += result.definition_count();
                }
                Err(e) => {
                    tracing::error!(path = %result.meta.path, error = %e, "file ingestion failed");
                    summary.failures.push((result.meta.path.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Ingest one file's mutations, retrying up to the bounded attempt
    /// count. Safe to retry because every write is a merge, never a blind
    /// create.
    pub fn ingest_file(&self, repository_id: i64, result: &ExtractionResult) -> Result<()> {
        let mut last_cause = String::new();

        for attempt in 1..=self.max_attempts {
            match self.apply_file(repository_id, result) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_cause = e.to_string();
                    tracing::warn!(
                        path = %result.meta.path,
                        attempt,
                        error = %e,
                        "ingestion attempt failed"
                    );
                    if attempt < self.max_attempts {
                        std::thread::sleep(self.backoff * attempt);
                    }
                }
            }
        }

        Err(Error::Ingest {
            path: result.meta.path.clone(),
            attempts: self.max_attempts,
            cause: last_cause,
        })
    }

    /// Apply one file's mutation set in a single transaction.
    ///
    /// All-or-nothing: a failure rolls everything back, so cancellation or
    /// a crash never leaves partial per-file state behind.
    fn apply_file(&self, repository_id: i64, result: &ExtractionResult) -> Result<()> {
        self.store.begin_transaction()?;

        let outcome = (|| -> Result<()> {
            let file_id = self.store.upsert_file(result)?;
            self.store.ensure_contains(repository_id, file_id)?;

            for name in &result.type_names {
                let def_id = self.store.upsert_definition(DefinitionKind::Type, name)?;
                self.store.ensure_defines(file_id, def_id)?;
            }
            for name in &result.callable_names {
                let def_id = self
                    .store
                    .upsert_definition(DefinitionKind::Callable, name)?;
                self.store.ensure_defines(file_id, def_id)?;
            }
            Ok(())
        })();

        match outcome {
            Ok(()) => self.store.commit(),
            Err(e) => {
                // Best effort; the connection drops the transaction anyway.
                let _ = self.store.rollback();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::report::FileMeta;

    fn result_with(
        path: &str,
        language: Language,
        types: &[&str],
        callables: &[&str],
    ) -> ExtractionResult {
        let meta = FileMeta::new(path, language, 20);
        let mut result = ExtractionResult::empty(meta);
        for t in types {
            result.type_names.insert(t.to_string());
        }
        for c in callables {
            result.callable_names.insert(c.to_string());
        }
        result
    }

    #[test]
    fn test_math_py_scenario() {
        let store = GraphStore::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&store);

        let result = result_with("math.py", Language::Python, &["Vector"], &["dot_product"]);
        let summary = ingestor.ingest("demo", [result]).unwrap();

        assert_eq!(summary.files_ingested, 1);
        assert_eq!(summary.definitions_linked, 2);

        let stats = store.stats().unwrap();
        assert_eq!(stats.repositories, 1);
        assert_eq!(stats.files, 1);
        assert_eq!(stats.types, 1);
        assert_eq!(stats.callables, 1);
        assert_eq!(stats.contains_edges, 1);
        assert_eq!(stats.defines_edges, 2);

        let defs = store.definitions_for_file("math.py").unwrap();
        assert_eq!(
            defs,
            vec![
                ("callable".to_string(), "dot_product".to_string()),
                ("type".to_string(), "Vector".to_string()),
            ]
        );
    }

    #[test]
    fn test_ingestion_is_idempotent() {
        let store = GraphStore::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&store);
        let result = result_with("a.py", Language::Python, &["A"], &["run", "stop"]);

        ingestor.ingest("demo", [result.clone()]).unwrap();
        let first = store.stats().unwrap();

        ingestor.ingest("demo", [result]).unwrap();
        let second = store.stats().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_ingestion_is_commutative() {
        let f1 = result_with("a.py", Language::Python, &["Shared"], &["run"]);
        let f2 = result_with("b.py", Language::Python, &["Shared"], &["walk"]);

        let store_ab = GraphStore::open_in_memory().unwrap();
        Ingestor::new(&store_ab)
            .ingest("demo", [f1.clone(), f2.clone()])
            .unwrap();

        let store_ba = GraphStore::open_in_memory().unwrap();
        Ingestor::new(&store_ba).ingest("demo", [f2, f1]).unwrap();

        assert_eq!(store_ab.stats().unwrap(), store_ba.stats().unwrap());
    }

    #[test]
    fn test_same_callable_name_across_repositories_merges() {
        let store = GraphStore::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&store);

        let f1 = result_with("one/lexer.py", Language::Python, &[], &["parse"]);
        let f2 = result_with("two/reader.rs", Language::Rust, &[], &["parse"]);

        ingestor.ingest("repo-one", [f1]).unwrap();
        ingestor.ingest("repo-two", [f2]).unwrap();

        // Name-only identity: one node, two incoming DEFINES edges.
        assert_eq!(store.count_definitions(DefinitionKind::Callable).unwrap(), 1);
        assert_eq!(
            store
                .defines_edge_count(DefinitionKind::Callable, "parse")
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_reingestion_reuses_repository_node() {
        let store = GraphStore::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&store);
        let result = result_with("a.py", Language::Python, &[], &["run"]);

        ingestor.ingest("demo", [result.clone()]).unwrap();
        ingestor.ingest("demo", [result]).unwrap();

        assert_eq!(store.count_repositories().unwrap(), 1);
        assert_eq!(store.count_contains_edges().unwrap(), 1);
    }

    /// Open a file-backed store, then break definition writes by dropping
    /// the defines_edges table through a second connection. Files that
    /// carry definitions fail on every attempt; files without them still
    /// commit.
    fn store_with_broken_definition_writes(dir: &std::path::Path) -> GraphStore {
        let db_path = dir.join("graph.db");
        let store = GraphStore::open(&db_path).unwrap();
        let saboteur = rusqlite::Connection::open(&db_path).unwrap();
        saboteur.execute_batch("DROP TABLE defines_edges").unwrap();
        store
    }

    #[test]
    fn test_retry_exhaustion_reports_bounded_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_broken_definition_writes(dir.path());
        let ingestor = Ingestor::new(&store).with_retry(2, Duration::from_millis(1));

        let repository_id = store.create_repository("demo").unwrap();
        let result = result_with("broken.py", Language::Python, &[], &["run"]);

        let err = ingestor.ingest_file(repository_id, &result).unwrap_err();
        match err {
            Error::Ingest { path, attempts, .. } => {
                assert_eq!(path, "broken.py");
                assert_eq!(attempts, 2);
            }
            other => panic!("expected an ingest error, got {other}"),
        }
        // Every attempt rolled back; no partial per-file state survives.
        assert!(store.file_id("broken.py").unwrap().is_none());
    }

    #[test]
    fn test_failed_file_is_recorded_without_aborting_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_broken_definition_writes(dir.path());
        let ingestor = Ingestor::new(&store).with_retry(2, Duration::from_millis(1));

        let broken = result_with("broken.py", Language::Python, &[], &["run"]);
        let meta = FileMeta::new("plain.py", Language::Python, 0);
        let plain = ExtractionResult::empty(meta);

        let summary = ingestor.ingest("demo", [broken, plain]).unwrap();

        assert_eq!(summary.files_ingested, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "broken.py");
        assert!(summary.failures[0].1.contains("2 attempts"));
        // The file after the failing one still committed.
        assert!(store.file_id("plain.py").unwrap().is_some());
        assert!(store.file_id("broken.py").unwrap().is_none());
    }

    #[test]
    fn test_empty_result_ingests_cleanly() {
        let store = GraphStore::open_in_memory().unwrap();
        let ingestor = Ingestor::new(&store);

        let meta = FileMeta::new("empty.py", Language::Python, 0);
        let summary = ingestor
            .ingest("demo", [ExtractionResult::empty(meta)])
            .unwrap();

        assert_eq!(summary.files_ingested, 1);
        assert_eq!(summary.definitions_linked, 0);
        assert_eq!(store.count_defines_edges().unwrap(), 0);
    }
}
