//! Java symbol extraction: classes, interfaces, enums, methods, and
//! import declarations.
//!
//! Java has no dedicated extraction rule; this is a best-effort addition
//! modeled on the Go extractor's shape (declaration -> parent-attributed
//! members -> import specs), since the data model expects Java files to
//! participate in symbol extraction like any other "code" language.

use crate::support::{col_range, line_range, node_text, preceding_doc_comment, truncate_signature};
use crate::{ExtractionResult, ImportDeclaration, Symbol, SymbolExtractor, SymbolKind};
use tree_sitter::{Node, Tree};

pub struct JavaExtractor;

impl SymbolExtractor for JavaExtractor {
    fn extract(&self, tree: &Tree, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let root = tree.root_node();
        walk(&root, source, None, &mut result);
        result
    }
}

fn walk(node: &Node, source: &str, parent: Option<&str>, out: &mut ExtractionResult) {
    match node.kind() {
        "class_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Class, parent);
                if let Some(body) = node.child_by_field_name("body") {
                    walk_children(&body, source, Some(&name), out);
                }
            }
            return;
        }
        "interface_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Interface, parent);
                if let Some(body) = node.child_by_field_name("body") {
                    walk_children(&body, source, Some(&name), out);
                }
            }
            return;
        }
        "enum_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Enum, parent);
            }
            return;
        }
        "method_declaration" | "constructor_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Method, parent);
            }
            return;
        }
        "field_declaration" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "variable_declarator" {
                    if let Some(name_node) = child.child_by_field_name("name") {
                        let name = node_text(source, &name_node).to_string();
                        push_symbol(out, node, source, &name, SymbolKind::Property, parent);
                    }
                }
            }
            return;
        }
        "import_declaration" => {
            if let Some(decl) = extract_import(node, source) {
                out.imports.push(decl);
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

fn is_exported(node: &Node, source: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.kind() == "modifiers" && node_text(source, &c).contains("public"))
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
        docstring: preceding_doc_comment(node, source),
        exported: is_exported(node, source),
        body: raw.to_string(),
    });
}

fn extract_import(node: &Node, source: &str) -> Option<ImportDeclaration> {
    let mut cursor = node.walk();
    let path_node = node
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
    let full = node_text(source, &path_node).to_string();
    let name = full.rsplit('.').next().unwrap_or(&full).to_string();
    Some(ImportDeclaration {
        source: full,
        imported_names: vec![name],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn public_class_is_exported() {
        let source = "public class Foo {\n  public void bar() {}\n}\n";
        let tree = parse(source);
        let result = JavaExtractor.extract(&tree, source);
        let class = result.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert!(class.exported);
        let method = result.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(method.parent_name.as_deref(), Some("Foo"));
        assert!(method.exported);
    }

    #[test]
    fn package_private_method_is_not_exported() {
        let source = "class Foo {\n  void bar() {}\n}\n";
        let tree = parse(source);
        let result = JavaExtractor.extract(&tree, source);
        let method = result.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert!(!method.exported);
    }

    #[test]
    fn import_declaration_is_collected() {
        let source = "import java.util.List;\n\nclass Foo {}\n";
        let tree = parse(source);
        let result = JavaExtractor.extract(&tree, source);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "java.util.List");
        assert_eq!(result.imports[0].imported_names, vec!["List"]);
    }
}
