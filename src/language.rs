//! Supported languages and extension dispatch
//!
//! The set of languages is a closed enum rather than an open string table:
//! every match on [`Language`] is checked exhaustively, so adding a language
//! forces every dispatch site (grammar, node categories) to handle it.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// A language with a bundled tree-sitter grammar.
///
/// Dialect variants get their own discriminant when they use a different
/// grammar: TypeScript vs TSX, and OCaml implementations (`.ml`) vs
/// interfaces (`.mli`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Php,
    OCaml,
    OCamlInterface,
}

impl Language {
    /// Get the string identifier for this language (stored in the graph)
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::OCaml => "ocaml",
            Language::OCamlInterface => "ocaml_interface",
        }
    }

    /// Get all supported languages
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Rust,
            Language::Go,
            Language::Java,
            Language::C,
            Language::Cpp,
            Language::Ruby,
            Language::Php,
            Language::OCaml,
            Language::OCamlInterface,
        ]
    }

    /// File extensions handled by this language
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "mts"],
            Language::Tsx => &["tsx"],
            Language::Rust => &["rs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
            Language::Ruby => &["rb"],
            Language::Php => &["php"],
            Language::OCaml => &["ml"],
            Language::OCamlInterface => &["mli"],
        }
    }

    /// Classify a file by its extension.
    ///
    /// Total over all inputs: unsupported or missing extensions yield
    /// `None`, never an error. No I/O happens here.
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext))
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| Error::UnsupportedLanguage(s.to_string()))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_roundtrip() {
        for lang in Language::all() {
            let parsed: Language = lang.as_str().parse().unwrap();
            assert_eq!(*lang, parsed);
        }
    }

    #[test]
    fn test_classify_common_extensions() {
        assert_eq!(Language::from_path(Path::new("a.py")), Some(Language::Python));
        assert_eq!(Language::from_path(Path::new("a.rs")), Some(Language::Rust));
        assert_eq!(Language::from_path(Path::new("a.go")), Some(Language::Go));
        assert_eq!(Language::from_path(Path::new("a.java")), Some(Language::Java));
        assert_eq!(Language::from_path(Path::new("a.rb")), Some(Language::Ruby));
        assert_eq!(Language::from_path(Path::new("a.php")), Some(Language::Php));
    }

    #[test]
    fn test_classify_dialect_splits() {
        assert_eq!(Language::from_path(Path::new("a.ts")), Some(Language::TypeScript));
        assert_eq!(Language::from_path(Path::new("a.tsx")), Some(Language::Tsx));
        assert_eq!(Language::from_path(Path::new("m.ml")), Some(Language::OCaml));
        assert_eq!(Language::from_path(Path::new("m.mli")), Some(Language::OCamlInterface));
    }

    #[test]
    fn test_classify_is_total() {
        assert_eq!(Language::from_path(Path::new("README.md")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
        assert_eq!(Language::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_no_extension_claimed_twice() {
        for lang in Language::all() {
            for ext in lang.extensions() {
                let claimants = Language::all()
                    .iter()
                    .filter(|l| l.extensions().contains(ext))
                    .count();
                assert_eq!(claimants, 1, "extension .{} claimed by {} languages", ext, claimants);
            }
        }
    }
}
