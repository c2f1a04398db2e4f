//! Symbol extraction from syntax trees
//!
//! Each language declares which node kinds denote a type definition, a
//! callable definition, and a module/package declaration. The extractor
//! walks the tree depth-first, resolves the declared name of every matching
//! node, and accumulates names into sorted sets. A node whose name cannot
//! be resolved is logged and skipped; it never aborts the rest of the file.

use crate::language::Language;
use crate::report::{ExtractionResult, FileMeta};
use tree_sitter::{Node, Tree};

/// Per-language classification of definition node kinds
pub struct NodeCategories {
    /// Node kinds that declare a type (class, struct, interface, enum, ...)
    pub type_kinds: &'static [&'static str],
    /// Node kinds that declare a callable (function, method, ...)
    pub callable_kinds: &'static [&'static str],
    /// Node kinds that declare the module/package name, if the language
    /// has such a construct
    pub module_kinds: &'static [&'static str],
}

/// The definition node categories for a language.
///
/// Exhaustive over [`Language`]: adding a language without a category
/// table is a compile error, not a silent runtime skip.
pub fn categories(language: Language) -> NodeCategories {
    match language {
        Language::Python => NodeCategories {
            type_kinds: &["class_definition"],
            callable_kinds: &["function_definition"],
            module_kinds: &[],
        },
        Language::JavaScript => NodeCategories {
            type_kinds: &["class_declaration"],
            callable_kinds: &[
                "function_declaration",
                "generator_function_declaration",
                "method_definition",
            ],
            module_kinds: &[],
        },
        Language::TypeScript | Language::Tsx => NodeCategories {
            type_kinds: &[
                "class_declaration",
                "abstract_class_declaration",
                "interface_declaration",
                "enum_declaration",
                "type_alias_declaration",
            ],
            callable_kinds: &["function_declaration", "method_definition"],
            module_kinds: &[],
        },
        Language::Rust => NodeCategories {
            type_kinds: &[
                "struct_item",
                "enum_item",
                "trait_item",
                "union_item",
                "type_item",
            ],
            callable_kinds: &["function_item", "function_signature_item"],
            module_kinds: &[],
        },
        Language::Go => NodeCategories {
            type_kinds: &["type_spec"],
            callable_kinds: &["function_declaration", "method_declaration"],
            module_kinds: &["package_clause"],
        },
        Language::Java => NodeCategories {
            type_kinds: &[
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "record_declaration",
            ],
            callable_kinds: &["method_declaration", "constructor_declaration"],
            module_kinds: &["package_declaration"],
        },
        Language::C => NodeCategories {
            type_kinds: &["struct_specifier", "union_specifier", "enum_specifier"],
            callable_kinds: &["function_definition"],
            module_kinds: &[],
        },
        Language::Cpp => NodeCategories {
            type_kinds: &[
                "class_specifier",
                "struct_specifier",
                "union_specifier",
                "enum_specifier",
            ],
            callable_kinds: &["function_definition"],
            module_kinds: &[],
        },
        Language::Ruby => NodeCategories {
            type_kinds: &["class", "module"],
            callable_kinds: &["method", "singleton_method"],
            module_kinds: &[],
        },
        Language::Php => NodeCategories {
            type_kinds: &[
                "class_declaration",
                "interface_declaration",
                "trait_declaration",
                "enum_declaration",
            ],
            callable_kinds: &["function_definition", "method_declaration"],
            module_kinds: &[],
        },
        Language::OCaml => NodeCategories {
            type_kinds: &["type_binding"],
            callable_kinds: &["let_binding"],
            module_kinds: &[],
        },
        Language::OCamlInterface => NodeCategories {
            type_kinds: &["type_binding"],
            callable_kinds: &["value_specification"],
            module_kinds: &[],
        },
    }
}

/// Walks syntax trees and produces normalized extraction results
pub struct Extractor {
    language: Language,
    categories: NodeCategories,
}

impl Extractor {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            categories: categories(language),
        }
    }

    /// Extract all definitions from a parsed file.
    ///
    /// Infallible by design: a file with no definitions yields empty name
    /// sets, and per-node resolution failures only skip that node.
    pub fn extract(&self, tree: &Tree, source: &[u8], meta: FileMeta) -> ExtractionResult {
        let mut result = ExtractionResult::empty(meta);
        self.walk(tree.root_node(), source, &mut result);
        result
    }

    fn walk(&self, node: Node, source: &[u8], result: &mut ExtractionResult) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let kind = child.kind();

            if self.categories.type_kinds.contains(&kind) {
                match self.declared_name(child, source) {
                    Some(name) => {
                        result.type_names.insert(name);
                    }
                    None => {
                        tracing::debug!(
                            path = %result.meta.path,
                            kind,
                            line = child.start_position().row + 1,
                            "skipping unnamed type node"
                        );
                    }
                }
            } else if self.categories.callable_kinds.contains(&kind) {
                match self.declared_name(child, source) {
                    Some(name) => {
                        result.callable_names.insert(name);
                    }
                    None => {
                        tracing::debug!(
                            path = %result.meta.path,
                            kind,
                            line = child.start_position().row + 1,
                            "skipping unnamed callable node"
                        );
                    }
                }
            } else if self.categories.module_kinds.contains(&kind) {
                if let Some(name) = Self::first_named_child_text(child, source) {
                    result.module_name = name;
                }
            }

            // Always recurse: definitions nest (methods in classes,
            // inner classes, closures).
            self.walk(child, source, result);
        }
    }

    /// Resolve the declared name of a definition node using the grammar's
    /// name-child convention for this language.
    fn declared_name(&self, node: Node, source: &[u8]) -> Option<String> {
        match (self.language, node.kind()) {
            // C-family function definitions bury the identifier inside a
            // declarator chain (pointers, parameter lists).
            (Language::C | Language::Cpp, "function_definition") => {
                let mut current = node;
                while let Some(inner) = current.child_by_field_name("declarator") {
                    current = inner;
                }
                Self::node_text(current, source)
            }
            // `let () = ...` and destructuring bindings are not callables;
            // only simple value names count.
            (Language::OCaml, "let_binding") => {
                let pattern = node.child_by_field_name("pattern")?;
                if pattern.kind() == "value_name" {
                    Self::node_text(pattern, source)
                } else {
                    None
                }
            }
            // `val name : type` in interface files
            (Language::OCamlInterface, "value_specification") => node
                .named_children(&mut node.walk())
                .find(|c| c.kind() == "value_name")
                .and_then(|c| Self::node_text(c, source)),
            _ => {
                let name_node = node.child_by_field_name("name")?;
                Self::node_text(name_node, source)
            }
        }
    }

    fn first_named_child_text(node: Node, source: &[u8]) -> Option<String> {
        let child = node.named_child(0)?;
        Self::node_text(child, source)
    }

    fn node_text(node: Node, source: &[u8]) -> Option<String> {
        node.utf8_text(source).ok().map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{FileParser, GrammarRegistry};

    fn extract(language: Language, path: &str, source: &str) -> ExtractionResult {
        let registry = GrammarRegistry::load_all();
        let mut parser = FileParser::for_language(&registry, language).unwrap();
        let tree = parser.parse(path, source.as_bytes()).unwrap();
        let meta = FileMeta::new(path, language, source.lines().count() as u32);
        Extractor::new(language).extract(&tree, source.as_bytes(), meta)
    }

    #[test]
    fn test_python_types_and_callables() {
        let source = r#"
class Vector:
    def __init__(self, x, y):
        self.x = x

def dot_product(a, b):
    return a.x * b.x
"#;
        let result = extract(Language::Python, "math.py", source);

        assert_eq!(result.module_name, "math");
        assert!(result.type_names.contains("Vector"));
        assert!(result.callable_names.contains("dot_product"));
        // Nested method is extracted too
        assert!(result.callable_names.contains("__init__"));
    }

    #[test]
    fn test_python_duplicate_names_collapse() {
        let source = "def run():\n    pass\n\ndef run():\n    pass\n";
        let result = extract(Language::Python, "dup.py", source);
        assert_eq!(result.callable_names.len(), 1);
    }

    #[test]
    fn test_empty_file_yields_empty_result() {
        let result = extract(Language::Python, "empty.py", "");
        assert_eq!(result.definition_count(), 0);
        assert_eq!(result.module_name, "empty");
    }

    #[test]
    fn test_rust_definitions() {
        let source = r#"
pub struct Config;
pub enum Mode { A, B }
pub trait Runner {
    fn run(&self);
}
fn helper() {}
"#;
        let result = extract(Language::Rust, "lib.rs", source);

        for name in ["Config", "Mode", "Runner"] {
            assert!(result.type_names.contains(name), "missing type {name}");
        }
        assert!(result.callable_names.contains("helper"));
        assert!(result.callable_names.contains("run"));
    }

    #[test]
    fn test_go_package_name_preferred_over_stem() {
        let source = "package server\n\ntype Handler struct{}\n\nfunc Serve() {}\n";
        let result = extract(Language::Go, "main.go", source);

        assert_eq!(result.module_name, "server");
        assert!(result.type_names.contains("Handler"));
        assert!(result.callable_names.contains("Serve"));
    }

    #[test]
    fn test_java_package_and_members() {
        let source = r#"
package com.example.app;

public class Widget {
    public Widget() {}
    public void render() {}
}

interface Drawable {}
"#;
        let result = extract(Language::Java, "Widget.java", source);

        assert_eq!(result.module_name, "com.example.app");
        assert!(result.type_names.contains("Widget"));
        assert!(result.type_names.contains("Drawable"));
        assert!(result.callable_names.contains("render"));
    }

    #[test]
    fn test_typescript_interfaces_and_aliases() {
        let source = r#"
interface Shape { area(): number; }
type Point = { x: number; y: number };
class Circle {
    radius: number;
    area(): number { return 3.14 * this.radius * this.radius; }
}
function describe(s: Shape): string { return ""; }
"#;
        let result = extract(Language::TypeScript, "shapes.ts", source);

        for name in ["Shape", "Point", "Circle"] {
            assert!(result.type_names.contains(name), "missing type {name}");
        }
        assert!(result.callable_names.contains("describe"));
        assert!(result.callable_names.contains("area"));
    }

    #[test]
    fn test_javascript_classes_and_functions() {
        let source = r#"
class Store {
    get(key) { return this.data[key]; }
}
function connect() {}
"#;
        let result = extract(Language::JavaScript, "store.js", source);

        assert!(result.type_names.contains("Store"));
        assert!(result.callable_names.contains("connect"));
        assert!(result.callable_names.contains("get"));
    }

    #[test]
    fn test_c_function_through_declarator_chain() {
        let source = r#"
struct point { int x; int y; };

int add(int a, int b) { return a + b; }

char *greeting(void) { return "hi"; }
"#;
        let result = extract(Language::C, "util.c", source);

        assert!(result.type_names.contains("point"));
        assert!(result.callable_names.contains("add"));
        // Name resolution drills through the pointer declarator
        assert!(result.callable_names.contains("greeting"));
    }

    #[test]
    fn test_ruby_classes_and_methods() {
        let source = r#"
module Billing
  class Invoice
    def total
      0
    end
  end
end
"#;
        let result = extract(Language::Ruby, "invoice.rb", source);

        assert!(result.type_names.contains("Billing"));
        assert!(result.type_names.contains("Invoice"));
        assert!(result.callable_names.contains("total"));
    }

    #[test]
    fn test_anonymous_nodes_are_skipped_not_fatal() {
        // Anonymous struct in a typedef has no name node; extraction
        // continues with the rest of the file.
        let source = "typedef struct { int x; } anon_t;\n\nint run(void) { return 0; }\n";
        let result = extract(Language::C, "anon.c", source);
        assert!(result.callable_names.contains("run"));
    }
}
