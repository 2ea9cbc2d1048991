//! Rust symbol extraction: functions, structs, enums, traits, impl methods,
//! and `use` imports.

use crate::support::{
    col_range, first_descendant_of_kind, has_child_of_kind, line_range, node_text,
    preceding_doc_comment, truncate_signature,
};
use crate::{ExtractionResult, ImportDeclaration, Symbol, SymbolExtractor, SymbolKind};
use tree_sitter::{Node, Tree};

pub struct RustExtractor;

impl SymbolExtractor for RustExtractor {
    fn extract(&self, tree: &Tree, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            walk(&child, source, None, &mut result);
        }
        result
    }
}

fn walk(node: &Node, source: &str, parent: Option<&str>, out: &mut ExtractionResult) {
    match node.kind() {
        "function_item" => {
            if let Some(name) = field_text(node, "name", source) {
                let kind = if parent.is_some() {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                push_symbol(out, node, source, &name, kind, parent);
            }
            return;
        }
        "struct_item" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Class, parent);
                let owner = name;
                walk_children(node, source, Some(&owner), out);
            }
            return;
        }
        "enum_item" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Enum, parent);
            }
            return;
        }
        "trait_item" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Interface, parent);
                let owner = name;
                walk_children(node, source, Some(&owner), out);
            }
            return;
        }
        "impl_item" => {
            if let Some(target) = impl_target_name(node, source) {
                if let Some(body) = node.child_by_field_name("body") {
                    walk_children(&body, source, Some(&target), out);
                }
            }
            return;
        }
        "use_declaration" => {
            if let Some(arg) = node.child_by_field_name("argument") {
                out.imports.extend(flatten_use_tree(&arg, source, ""));
            }
            return;
        }
        "mod_item" => {
            if let Some(body) = node.child_by_field_name("body") {
                walk_children(&body, source, parent, out);
            }
            return;
        }
        _ => {}
    }
    walk_children(node, source, parent, out);
}

fn walk_children(node: &Node, source: &str, parent: Option<&str>, out: &mut ExtractionResult) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(&child, source, parent, out);
    }
}

fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| node_text(source, &n).to_string())
}

fn is_exported(node: &Node) -> bool {
    has_child_of_kind(node, "visibility_modifier")
}

fn push_symbol(
    out: &mut ExtractionResult,
    node: &Node,
    source: &str,
    name: &str,
    kind: SymbolKind,
    parent: Option<&str>,
) {
    let (start_line, end_line) = line_range(node);
    let (start_col, end_col) = col_range(node);
    let raw = node_text(source, node);
    let signature = Some(truncate_signature(raw, false));
    let docstring = preceding_doc_comment(node, source);
    out.symbols.push(Symbol {
        name: name.to_string(),
        kind,
        signature,
        start_line,
        end_line,
        start_col,
        end_col,
        parent_name: parent.map(str::to_string),
        docstring,
        exported: is_exported(node),
        body: raw.to_string(),
    });
}

/// The `Self` type name of an `impl Trait for Type` or `impl Type` block,
/// stripped of generic parameters.
fn impl_target_name(node: &Node, source: &str) -> Option<String> {
    let ty = node.child_by_field_name("type")?;
    let ident = first_descendant_of_kind(&ty, "type_identifier")
        .or_else(|| first_descendant_of_kind(&ty, "identifier"))?;
    Some(node_text(source, &ident).to_string())
}

/// Flatten a `use_tree` into imported-name declarations. Handles plain
/// paths, `as` aliases, lists (`{a, b}`), and wildcards, recording the
/// textual prefix as `source`.
fn flatten_use_tree(node: &Node, source: &str, prefix: &str) -> Vec<ImportDeclaration> {
    match node.kind() {
        "scoped_use_list" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| node_text(source, &n).to_string())
                .unwrap_or_default();
            let full_prefix = join_prefix(prefix, &path);
            let mut out = Vec::new();
            if let Some(list) = node.child_by_field_name("list") {
                let mut cursor = list.walk();
                for child in list.children(&mut cursor) {
                    out.extend(flatten_use_tree(&child, source, &full_prefix));
                }
            }
            out
        }
        "use_list" => {
            let mut out = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                out.extend(flatten_use_tree(&child, source, prefix));
            }
            out
        }
        "use_as_clause" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| node_text(source, &n).to_string())
                .unwrap_or_default();
            let alias = node
                .child_by_field_name("alias")
                .map(|n| node_text(source, &n).to_string())
                .unwrap_or(path.clone());
            vec![ImportDeclaration {
                source: join_prefix(prefix, &path),
                imported_names: vec![alias],
            }]
        }
        "use_wildcard" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| node_text(source, &n).to_string())
                .unwrap_or_default();
            vec![ImportDeclaration {
                source: join_prefix(prefix, &path),
                imported_names: vec!["*".to_string()],
            }]
        }
        "scoped_identifier" | "identifier" | "crate" | "self" | "super" => {
            let full = node_text(source, node).to_string();
            let name = full.rsplit("::").next().unwrap_or(&full).to_string();
            vec![ImportDeclaration {
                source: join_prefix(prefix, &full),
                imported_names: vec![name],
            }]
        }
        _ => {
            let mut out = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                out.extend(flatten_use_tree(&child, source, prefix));
            }
            out
        }
    }
}

fn join_prefix(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}::{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn extracts_top_level_function() {
        let source = "pub fn foo() -> i32 { 1 }";
        let tree = parse(source);
        let result = RustExtractor.extract(&tree, source);
        assert_eq!(result.symbols.len(), 1);
        let sym = &result.symbols[0];
        assert_eq!(sym.name, "foo");
        assert_eq!(sym.kind.as_str(), "function");
        assert!(sym.exported);
        assert!(sym.parent_name.is_none());
    }

    #[test]
    fn impl_methods_get_struct_as_parent() {
        let source = "struct Foo;\nimpl Foo {\n    fn bar(&self) {}\n}";
        let tree = parse(source);
        let result = RustExtractor.extract(&tree, source);
        let method = result
            .symbols
            .iter()
            .find(|s| s.name == "bar")
            .expect("method found");
        assert_eq!(method.kind.as_str(), "method");
        assert_eq!(method.parent_name.as_deref(), Some("Foo"));
        assert!(!method.exported);
    }

    #[test]
    fn use_declaration_becomes_import() {
        let source = "use std::collections::HashMap;";
        let tree = parse(source);
        let result = RustExtractor.extract(&tree, source);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].imported_names, vec!["HashMap"]);
    }
}
