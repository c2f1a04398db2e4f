//! Path filtering for the repository walker

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Directories and file patterns that never contain source worth parsing.
const DEFAULT_EXCLUDES: &[&str] = &[
    // Dependency and build output directories
    "node_modules/",
    "venv/",
    ".venv/",
    "__pycache__/",
    "target/",
    "vendor/",
    "dist/",
    "build/",
    "out/",
    // Version control and tool state
    ".git/",
    ".hg/",
    ".svn/",
    ".idea/",
    ".vscode/",
    ".repograph/",
    // Binary and generated noise
    "*.min.js",
    "*.pyc",
    "*.class",
    "*.o",
    "*.so",
    "*.db",
    "*.sqlite",
];

/// Gitignore-aware filter with built-in noise excludes.
///
/// Combines the repository's own `.gitignore`/`.ignore` with the default
/// exclude set and any patterns from the config file.
pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        for pattern in DEFAULT_EXCLUDES {
            // Static patterns; a parse failure here would be a bug.
            builder.add_line(None, pattern).ok();
        }
        for pattern in extra_excludes {
            if builder.add_line(None, pattern).is_err() {
                tracing::warn!(pattern, "ignoring invalid exclude pattern");
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes() {
        let filter = IgnoreFilter::new(Path::new("/repo"), &[]);
        assert!(filter.is_ignored(Path::new("/repo/node_modules"), true));
        assert!(filter.is_ignored(Path::new("/repo/__pycache__"), true));
        assert!(filter.is_ignored(Path::new("/repo/app.pyc"), false));
        assert!(!filter.is_ignored(Path::new("/repo/src/app.py"), false));
    }

    #[test]
    fn test_extra_excludes() {
        let filter = IgnoreFilter::new(Path::new("/repo"), &["generated/".to_string()]);
        assert!(filter.is_ignored(Path::new("/repo/generated"), true));
    }
}
