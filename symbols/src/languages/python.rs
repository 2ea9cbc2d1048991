//! Python symbol extraction: function/class definitions, methods, and
//! import/from-import statements.

use crate::support::{col_range, line_range, node_text, truncate_signature};
use crate::{ExtractionResult, ImportDeclaration, Symbol, SymbolExtractor, SymbolKind};
use tree_sitter::{Node, Tree};

pub struct PythonExtractor;

impl SymbolExtractor for PythonExtractor {
    fn extract(&self, tree: &Tree, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let root = tree.root_node();
        walk(&root, source, None, &mut result);
        result
    }
}

fn walk(node: &Node, source: &str, parent: Option<&str>, out: &mut ExtractionResult) {
    match node.kind() {
        "function_definition" => {
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
        "class_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Class, parent);
                if let Some(body) = node.child_by_field_name("body") {
                    walk_children(&body, source, Some(&name), out);
                }
            }
            return;
        }
        "import_statement" => {
            out.imports.extend(extract_import(node, source));
            return;
        }
        "import_from_statement" => {
            out.imports.extend(extract_import_from(node, source));
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
    out.symbols.push(Symbol {
        name: name.to_string(),
        kind,
        signature,
        start_line,
        end_line,
        start_col,
        end_col,
        parent_name: parent.map(str::to_string),
        docstring: function_docstring(node, source),
        exported: !name.starts_with('_'),
        body: raw.to_string(),
    });
}

/// The string expression that is the first statement of the body, for
/// `function_definition` nodes.
fn function_docstring(node: &Node, source: &str) -> Option<String> {
    if node.kind() != "function_definition" {
        return None;
    }
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body.children(&mut cursor).next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let mut cursor = first.walk();
    let expr = first.children(&mut cursor).next()?;
    if expr.kind() != "string" {
        return None;
    }
    Some(strip_string_quotes(node_text(source, &expr)))
}

fn strip_string_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("r")
        .unwrap_or(trimmed)
        .strip_prefix("u")
        .unwrap_or(trimmed);
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(rest) = trimmed.strip_prefix(quote) {
            if let Some(body) = rest.strip_suffix(quote) {
                return body.trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

fn extract_import(node: &Node, source: &str) -> Vec<ImportDeclaration> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let path = node_text(source, &child).to_string();
                let name = path.rsplit('.').next().unwrap_or(&path).to_string();
                out.push(ImportDeclaration {
                    source: path,
                    imported_names: vec![name],
                });
            }
            "aliased_import" => {
                if let (Some(path_node), Some(alias_node)) = (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("alias"),
                ) {
                    out.push(ImportDeclaration {
                        source: node_text(source, &path_node).to_string(),
                        imported_names: vec![node_text(source, &alias_node).to_string()],
                    });
                }
            }
            _ => {}
        }
    }
    out
}

fn extract_import_from(node: &Node, source: &str) -> Vec<ImportDeclaration> {
    let module = node
        .child_by_field_name("module_name")
        .map(|n| node_text(source, &n).to_string())
        .unwrap_or_default();

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" | "identifier" => {
                if child.start_byte()
                    != node
                        .child_by_field_name("module_name")
                        .map(|n| n.start_byte())
                        .unwrap_or(usize::MAX)
                {
                    names.push(node_text(source, &child).to_string());
                }
            }
            "aliased_import" => {
                if let Some(alias_node) = child.child_by_field_name("alias") {
                    names.push(node_text(source, &alias_node).to_string());
                }
            }
            "wildcard_import" => names.push("*".to_string()),
            _ => {}
        }
    }

    if names.is_empty() {
        return Vec::new();
    }
    vec![ImportDeclaration {
        source: module,
        imported_names: names,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn extracts_function_with_docstring() {
        let source = "def foo():\n    \"\"\"does a thing\"\"\"\n    return 1\n";
        let tree = parse(source);
        let result = PythonExtractor.extract(&tree, source);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "foo");
        assert_eq!(result.symbols[0].docstring.as_deref(), Some("does a thing"));
        assert!(result.symbols[0].exported);
    }

    #[test]
    fn private_function_is_not_exported() {
        let source = "def _helper():\n    pass\n";
        let tree = parse(source);
        let result = PythonExtractor.extract(&tree, source);
        assert!(!result.symbols[0].exported);
    }

    #[test]
    fn class_methods_get_class_as_parent() {
        let source = "class Foo:\n    def bar(self):\n        pass\n";
        let tree = parse(source);
        let result = PythonExtractor.extract(&tree, source);
        let method = result.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(method.parent_name.as_deref(), Some("Foo"));
        assert_eq!(method.kind.as_str(), "method");
    }

    #[test]
    fn from_import_collects_names() {
        let source = "from os.path import join, exists\n";
        let tree = parse(source);
        let result = PythonExtractor.extract(&tree, source);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "os.path");
        assert_eq!(result.imports[0].imported_names, vec!["join", "exists"]);
    }
}
