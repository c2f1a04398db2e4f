//! Repository walking
//!
//! Enumerates candidate files for the pipeline: gitignore- and
//! noise-filtered, under the size ceiling, and already classified by
//! language. Files with unsupported extensions are excluded here and never
//! reach the parse stage at all.

use crate::ignore::IgnoreFilter;
use crate::language::Language;
use crate::Result;
use std::path::{Path, PathBuf};

/// Files above this size are skipped (generated bundles, vendored blobs).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500_000;

/// One candidate source file with its language tag
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the walk root (the graph key)
    pub relative_path: String,
    pub language: Language,
}

/// Walks a repository root and produces the candidate file list
pub struct Walker {
    root: PathBuf,
    filter: IgnoreFilter,
    max_file_size: u64,
}

impl Walker {
    pub fn new(root: &Path, extra_excludes: &[String], max_file_size: u64) -> Self {
        Self {
            root: root.to_path_buf(),
            filter: IgnoreFilter::new(root, extra_excludes),
            max_file_size,
        }
    }

    /// Enumerate candidate files, sorted by relative path for a stable
    /// processing order.
    pub fn candidates(&self) -> Result<Vec<CandidateFile>> {
        let mut files = Vec::new();
        self.visit(&self.root, &mut files)?;
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    fn visit(&self, dir: &Path, files: &mut Vec<CandidateFile>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                if !self.filter.is_ignored(&path, true) {
                    if let Err(e) = self.visit(&path, files) {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable directory");
                    }
                }
                continue;
            }
            if self.filter.is_ignored(&path, false) {
                continue;
            }

            let Some(language) = Language::from_path(&path) else {
                continue;
            };

            // Stat failures (dangling or looping symlinks, files deleted
            // mid-walk) skip this entry only, never the directory.
            let metadata = match std::fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            let size = metadata.len();
            if size > self.max_file_size {
                tracing::debug!(path = %path.display(), size, "skipping oversized file");
                continue;
            }

            let relative_path = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            files.push(CandidateFile {
                path,
                relative_path,
                language,
            });
        }
        Ok(())
    }
}
