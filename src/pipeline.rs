//! The extraction pipeline
//!
//! Parsing and extraction are pure per-file operations, so they run on a
//! bounded worker pool: K workers pull candidates off a channel, parse and
//! extract, and send results to a single coordinator. Only the coordinator
//! touches the graph store, which serializes same-entity writes without any
//! locking in the store itself. Channel bounds provide backpressure, so at
//! most a few files are in flight per worker.

use crate::extract::Extractor;
use crate::grammar::{FileParser, GrammarRegistry};
use crate::ingest::Ingestor;
use crate::language::Language;
use crate::report::{ExtractionResult, FileMeta};
use crate::store::GraphStore;
use crate::ui::progress::ProgressMessage;
use crate::walker::CandidateFile;
use crate::{FailureKind, Result};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicBool, Ordering};

/// Log a progress line every this many files (visible without a terminal).
const PROGRESS_LOG_EVERY: usize = 25;

/// Per-file outcome flowing from workers to the coordinator
enum FileOutcome {
    Extracted(ExtractionResult),
    /// Grammar for the file's language did not load; the file is skipped.
    Skipped { path: String, language: Language },
    Failed {
        path: String,
        kind: FailureKind,
        cause: String,
    },
}

/// Counters for one pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_considered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub definitions_linked: usize,
    pub failure_counts: HashMap<FailureKind, usize>,
}

impl RunSummary {
    fn record_failure(&mut self, kind: FailureKind) {
        self.files_failed += 1;
        *self.failure_counts.entry(kind).or_insert(0) += 1;
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run summary:")?;
        writeln!(f, "  Files considered: {}", self.files_considered)?;
        writeln!(f, "  Files processed: {}", self.files_processed)?;
        writeln!(f, "  Files skipped (grammar unavailable): {}", self.files_skipped)?;
        writeln!(f, "  Definitions linked: {}", self.definitions_linked)?;
        write!(f, "  Files failed: {}", self.files_failed)?;
        if self.files_failed > 0 {
            let mut parts = Vec::new();
            for kind in [
                FailureKind::Parse,
                FailureKind::Extraction,
                FailureKind::Ingest,
                FailureKind::Io,
                FailureKind::GrammarLoad,
                FailureKind::UnsupportedLanguage,
            ] {
                if let Some(count) = self.failure_counts.get(&kind) {
                    parts.push(format!("{}: {}", kind, count));
                }
            }
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Parallel parse/extract pipeline feeding a serialized ingestion stage
pub struct Pipeline<'a> {
    registry: &'a GrammarRegistry,
    workers: usize,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a GrammarRegistry, workers: usize) -> Self {
        Self {
            registry,
            workers: workers.max(1),
        }
    }

    /// Run the full pipeline: parse, extract and ingest every candidate
    /// into the named repository.
    ///
    /// A failure to create the repository node is fatal (the store is
    /// unreachable); everything else is local to one file.
    pub fn run(
        &self,
        candidates: Vec<CandidateFile>,
        store: &GraphStore,
        repository: &str,
        stop: &AtomicBool,
        progress: Option<&Sender<ProgressMessage>>,
    ) -> Result<RunSummary> {
        let ingestor = Ingestor::new(store);
        let repository_id = store.create_repository(repository)?;

        let summary = self.process(candidates, stop, progress, |result| {
            let definitions = result.definition_count();
            ingestor.ingest_file(repository_id, &result)?;
            Ok(definitions)
        });

        Ok(summary)
    }

    /// Parse and extract without touching the store (dry run).
    pub fn extract(
        &self,
        candidates: Vec<CandidateFile>,
        stop: &AtomicBool,
    ) -> (Vec<ExtractionResult>, RunSummary) {
        let mut results = Vec::new();
        let summary = self.process(candidates, stop, None, |result| {
            let definitions = result.definition_count();
            results.push(result);
            Ok(definitions)
        });
        (results, summary)
    }

    /// Fan candidates out to the worker pool and hand each extraction
    /// result to `sink` on the coordinator thread, in completion order.
    fn process<F>(
        &self,
        candidates: Vec<CandidateFile>,
        stop: &AtomicBool,
        progress: Option<&Sender<ProgressMessage>>,
        mut sink: F,
    ) -> RunSummary
    where
        F: FnMut(ExtractionResult) -> Result<usize>,
    {
        let mut summary = RunSummary {
            files_considered: candidates.len(),
            ..RunSummary::default()
        };
        let total = candidates.len();

        let (job_tx, job_rx) = bounded::<CandidateFile>(self.workers * 2);
        let (out_tx, out_rx) = bounded::<FileOutcome>(self.workers * 2);

        std::thread::scope(|scope| {
            let registry = self.registry;

            for _ in 0..self.workers {
                let jobs = job_rx.clone();
                let out = out_tx.clone();
                scope.spawn(move || worker_loop(registry, jobs, out, stop));
            }
            drop(job_rx);
            drop(out_tx);

            scope.spawn(move || {
                for candidate in candidates {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    if job_tx.send(candidate).is_err() {
                        break;
                    }
                }
            });

            let mut seen = 0usize;
            for outcome in out_rx {
                seen += 1;
                let file = match &outcome {
                    FileOutcome::Extracted(result) => result.meta.path.clone(),
                    FileOutcome::Skipped { path, .. } | FileOutcome::Failed { path, .. } => {
                        path.clone()
                    }
                };

                match outcome {
                    FileOutcome::Extracted(result) => match sink(result) {
                        Ok(definitions) => {
                            summary.files_processed += 1;
                            summary.definitions_linked += definitions;
                        }
                        Err(e) => {
                            summary.record_failure(e.failure_kind());
                        }
                    },
                    FileOutcome::Skipped { path, language } => {
                        tracing::warn!(path, language = %language, "grammar unavailable, file skipped");
                        summary.files_skipped += 1;
                    }
                    FileOutcome::Failed { path, kind, cause } => {
                        tracing::error!(path, kind = %kind, cause, "file failed");
                        summary.record_failure(kind);
                    }
                }

                if let Some(tx) = progress {
                    let _ = tx.send(ProgressMessage::Progress { file });
                }
                if seen % PROGRESS_LOG_EVERY == 0 {
                    tracing::info!("processed {}/{} files", seen, total);
                }
            }
        });

        if let Some(tx) = progress {
            let _ = tx.send(ProgressMessage::Finished);
        }
        summary
    }
}

fn worker_loop(
    registry: &GrammarRegistry,
    jobs: Receiver<CandidateFile>,
    out: Sender<FileOutcome>,
    stop: &AtomicBool,
) {
    // One parser per language per worker; bound once, never re-targeted.
    let mut parsers: HashMap<Language, FileParser> = HashMap::new();

    for job in jobs {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let outcome = process_one(registry, &mut parsers, &job);
        if out.send(outcome).is_err() {
            break;
        }
    }
}

fn process_one(
    registry: &GrammarRegistry,
    parsers: &mut HashMap<Language, FileParser>,
    job: &CandidateFile,
) -> FileOutcome {
    if registry.resolve(job.language).is_none() {
        return FileOutcome::Skipped {
            path: job.relative_path.clone(),
            language: job.language,
        };
    }

    let source = match std::fs::read(&job.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return FileOutcome::Failed {
                path: job.relative_path.clone(),
                kind: FailureKind::Io,
                cause: e.to_string(),
            };
        }
    };

    let parser = match parsers.entry(job.language) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(slot) => match FileParser::for_language(registry, job.language) {
            Ok(parser) => slot.insert(parser),
            Err(e) => {
                return FileOutcome::Failed {
                    path: job.relative_path.clone(),
                    kind: FailureKind::GrammarLoad,
                    cause: e.to_string(),
                };
            }
        },
    };

    let tree = match parser.parse(&job.relative_path, &source) {
        Ok(tree) => tree,
        Err(e) => {
            return FileOutcome::Failed {
                path: job.relative_path.clone(),
                kind: FailureKind::Parse,
                cause: e.to_string(),
            };
        }
    };

    let line_count = String::from_utf8_lossy(&source).lines().count() as u32;
    let meta = FileMeta::new(job.relative_path.clone(), job.language, line_count);
    let result = Extractor::new(job.language).extract(&tree, &source, meta);

    FileOutcome::Extracted(result)
}
