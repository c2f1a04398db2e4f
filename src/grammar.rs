//! Grammar registry and file parsing
//!
//! All grammars are compiled in, but a grammar can still fail to load at
//! runtime (ABI mismatch between the grammar crate and the tree-sitter
//! runtime). The registry attempts every language once at startup, records
//! per-language outcomes, and never lets one broken grammar block the rest.
//!
//! Parsers are never shared: each [`FileParser`] is bound to exactly one
//! grammar at construction and its language is never reassigned, so worker
//! threads can each hold their own parser with no synchronization.

use crate::language::Language;
use crate::{Error, Result};
use std::collections::HashMap;
use tree_sitter::{Parser, Tree};

/// Parse timeout per file. A pathological grammar/input pair must not
/// stall the whole run.
const PARSE_TIMEOUT_MICROS: u64 = 5_000_000;

/// Return the tree-sitter grammar for a language.
fn raw_grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::Java => tree_sitter_java::LANGUAGE.into(),
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        Language::Ruby => tree_sitter_ruby::LANGUAGE.into(),
        Language::Php => tree_sitter_php::LANGUAGE_PHP.into(),
        Language::OCaml => tree_sitter_ocaml::LANGUAGE_OCAML.into(),
        Language::OCamlInterface => tree_sitter_ocaml::LANGUAGE_OCAML_INTERFACE.into(),
    }
}

/// Registry of loaded grammar handles.
///
/// Built once at startup and immutable afterwards; shared by reference
/// across worker threads.
pub struct GrammarRegistry {
    grammars: HashMap<Language, tree_sitter::Language>,
    failures: HashMap<Language, String>,
}

impl GrammarRegistry {
    /// Attempt to load every declared grammar.
    ///
    /// Emits one diagnostic line per language. A load failure is recorded
    /// and that language is skipped for the whole run; it never aborts
    /// registry construction.
    pub fn load_all() -> Self {
        let mut grammars = HashMap::new();
        let mut failures = HashMap::new();

        for &language in Language::all() {
            let grammar = raw_grammar(language);
            // A scratch parser verifies runtime/grammar ABI compatibility.
            match Parser::new().set_language(&grammar) {
                Ok(()) => {
                    tracing::info!(language = %language, "grammar loaded");
                    grammars.insert(language, grammar);
                }
                Err(e) => {
                    tracing::warn!(language = %language, error = %e, "grammar failed to load");
                    failures.insert(language, e.to_string());
                }
            }
        }

        Self { grammars, failures }
    }

    /// Resolve the grammar handle for a language, if it loaded.
    pub fn resolve(&self, language: Language) -> Option<&tree_sitter::Language> {
        self.grammars.get(&language)
    }

    /// Languages whose grammar loaded successfully
    pub fn loaded(&self) -> impl Iterator<Item = Language> + '_ {
        Language::all()
            .iter()
            .copied()
            .filter(|l| self.grammars.contains_key(l))
    }

    /// Languages whose grammar failed to load, with the recorded cause
    pub fn failed(&self) -> impl Iterator<Item = (Language, &str)> + '_ {
        Language::all()
            .iter()
            .copied()
            .filter_map(|l| self.failures.get(&l).map(|cause| (l, cause.as_str())))
    }
}

/// A parser bound to one immutable grammar.
///
/// Cheap to construct; each worker thread builds its own per language as
/// needed. `parse` is the only mutation (tree-sitter parsers keep internal
/// scratch state), which is why parsers are never shared across threads.
pub struct FileParser {
    language: Language,
    parser: Parser,
}

impl FileParser {
    /// Create a parser for a language, resolving its grammar in the registry.
    pub fn for_language(registry: &GrammarRegistry, language: Language) -> Result<Self> {
        let grammar = registry
            .resolve(language)
            .ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(grammar)
            .map_err(|e| Error::GrammarLoad {
                language,
                cause: e.to_string(),
            })?;
        parser.set_timeout_micros(PARSE_TIMEOUT_MICROS);

        Ok(Self { language, parser })
    }

    /// Override the per-file parse timeout.
    pub fn with_timeout_micros(mut self, micros: u64) -> Self {
        self.parser.set_timeout_micros(micros);
        self
    }

    /// The language this parser is bound to
    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse raw file bytes into a syntax tree.
    ///
    /// Fails only when tree-sitter produces no tree at all (timeout or
    /// grammar mismatch); a tree containing error nodes is still returned,
    /// since extraction can work around localized syntax errors.
    pub fn parse(&mut self, path: &str, source: &[u8]) -> Result<Tree> {
        self.parser.parse(source, None).ok_or_else(|| Error::Parse {
            path: path.to_string(),
            language: self.language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_grammars_load() {
        let registry = GrammarRegistry::load_all();
        for &language in Language::all() {
            assert!(
                registry.resolve(language).is_some(),
                "grammar for {} did not load",
                language
            );
        }
        assert_eq!(registry.failed().count(), 0);
    }

    #[test]
    fn test_dispatch_is_independent_of_availability() {
        // Classification never consults the registry: every extension maps
        // to its language id whether or not the grammar loaded.
        let registry = GrammarRegistry::load_all();
        for &language in Language::all() {
            for ext in language.extensions() {
                let name = format!("file.{ext}");
                assert_eq!(
                    Language::from_path(std::path::Path::new(&name)),
                    Some(language)
                );
            }
            assert!(registry.resolve(language).is_some());
        }
    }

    #[test]
    fn test_parser_is_bound_to_one_language() {
        let registry = GrammarRegistry::load_all();
        let mut parser = FileParser::for_language(&registry, Language::Python).unwrap();
        assert_eq!(parser.language(), Language::Python);

        let tree = parser.parse("a.py", b"def f():\n    pass\n").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_survives_broken_input() {
        let registry = GrammarRegistry::load_all();
        let mut parser = FileParser::for_language(&registry, Language::Rust).unwrap();

        // Malformed input still yields a tree (with error nodes), not a failure.
        let tree = parser.parse("a.rs", b"fn ( broken {{{{").unwrap();
        assert!(tree.root_node().has_error());
    }

    #[test]
    fn test_timed_out_parse_yields_parse_error() {
        let registry = GrammarRegistry::load_all();
        let mut parser = FileParser::for_language(&registry, Language::Python)
            .unwrap()
            .with_timeout_micros(1);

        // Large enough that the deadline fires mid-parse and tree-sitter
        // returns no tree at all.
        let source: String = (0..20_000)
            .map(|i| format!("def f{i}(a, b):\n    return a + b\n"))
            .collect();
        let err = parser.parse("big.py", source.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.failure_kind(), crate::FailureKind::Parse);
    }
}
