//! TypeScript/TSX/JavaScript symbol extraction: function declarations,
//! arrow-function variable declarators, classes (with methods/fields),
//! interfaces, type aliases, enums, and import statements.
//!
//! One extractor serves all three languages: interface/type-alias/enum
//! node kinds simply never appear in a plain JavaScript tree, so the same
//! walk degrades gracefully.

use crate::support::{col_range, line_range, node_text, truncate_signature};
use crate::{ExtractionResult, ImportDeclaration, Symbol, SymbolExtractor, SymbolKind};
use tree_sitter::{Node, Tree};

pub struct TypeScriptExtractor;

impl SymbolExtractor for TypeScriptExtractor {
    fn extract(&self, tree: &Tree, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let root = tree.root_node();
        walk(&root, source, None, &mut result);
        result
    }
}

fn walk(node: &Node, source: &str, parent: Option<&str>, out: &mut ExtractionResult) {
    match node.kind() {
        "function_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Function, parent, false);
            }
            return;
        }
        "class_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Class, parent, false);
                if let Some(body) = node.child_by_field_name("body") {
                    walk_children(&body, source, Some(&name), out);
                }
            }
            return;
        }
        "method_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Method, parent, true);
            }
            return;
        }
        "public_field_definition" | "field_definition" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Property, parent, true);
            }
            return;
        }
        "interface_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Interface, parent, false);
            }
            return;
        }
        "type_alias_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Type, parent, false);
            }
            return;
        }
        "enum_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Enum, parent, false);
            }
            return;
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let Some(value) = declarator.child_by_field_name("value") else {
                    continue;
                };
                if matches!(value.kind(), "arrow_function" | "function_expression") {
                    if let Some(name) = field_text(&declarator, "name", source) {
                        push_symbol(
                            out,
                            &declarator,
                            source,
                            &name,
                            SymbolKind::Function,
                            parent,
                            false,
                        );
                    }
                }
            }
            return;
        }
        "import_statement" => {
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

/// Wrapped in an `export_statement`, up to two ancestor levels up to cover
/// `export const foo = ...` (variable_declarator -> declaration -> export).
fn is_exported(node: &Node) -> bool {
    let mut cur = node.parent();
    for _ in 0..3 {
        match cur {
            Some(n) if n.kind() == "export_statement" => return true,
            Some(n) => cur = n.parent(),
            None => break,
        }
    }
    false
}

fn push_symbol(
    out: &mut ExtractionResult,
    node: &Node,
    source: &str,
    name: &str,
    kind: SymbolKind,
    parent: Option<&str>,
    class_member: bool,
) {
    let (start_line, end_line) = line_range(node);
    let (start_col, end_col) = col_range(node);
    let raw = node_text(source, node);
    let stop_at_newline = matches!(kind, SymbolKind::Type);
    let signature = Some(truncate_signature(raw, stop_at_newline));
    // Class members inherit the export status of the enclosing class.
    let exported = if class_member {
        node.parent()
            .and_then(|class_body| class_body.parent())
            .map(|class_decl| is_exported(&class_decl))
            .unwrap_or(false)
    } else {
        is_exported(node)
    };
    out.symbols.push(Symbol {
        name: name.to_string(),
        kind,
        signature,
        start_line,
        end_line,
        start_col,
        end_col,
        parent_name: parent.map(str::to_string),
        docstring: crate::support::preceding_doc_comment(node, source),
        exported,
        body: raw.to_string(),
    });
}

fn extract_import(node: &Node, source: &str) -> Option<ImportDeclaration> {
    let source_node = node.child_by_field_name("source")?;
    let module = strip_quotes(node_text(source, &source_node));

    let mut names = Vec::new();
    if let Some(clause) = node.child_by_field_name("import_clause") {
        collect_import_names(&clause, source, &mut names);
    } else {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            collect_import_names(&child, source, &mut names);
        }
    }

    Some(ImportDeclaration {
        source: module,
        imported_names: names,
    })
}

fn collect_import_names(node: &Node, source: &str, names: &mut Vec<String>) {
    match node.kind() {
        "identifier" => names.push(node_text(source, node).to_string()),
        "namespace_import" => names.push("*".to_string()),
        "named_imports" => {
            let mut cursor = node.walk();
            for spec in node.children(&mut cursor) {
                if spec.kind() == "import_specifier" {
                    let target = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"));
                    if let Some(t) = target {
                        names.push(node_text(source, &t).to_string());
                    }
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_import_names(&child, source, names);
            }
        }
    }
}

fn strip_quotes(raw: &str) -> String {
    let t = raw.trim();
    for quote in ['"', '\''] {
        if t.len() >= 2 && t.starts_with(quote) && t.ends_with(quote) {
            return t[1..t.len() - 1].to_string();
        }
    }
    t.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ts(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    fn parse_js(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn extracts_exported_function() {
        let source = "export function foo() { return 1; }";
        let tree = parse_js(source);
        let result = TypeScriptExtractor.extract(&tree, source);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "foo");
        assert!(result.symbols[0].exported);
    }

    #[test]
    fn arrow_function_variable_is_a_function_symbol() {
        let source = "const add = (a, b) => a + b;";
        let tree = parse_js(source);
        let result = TypeScriptExtractor.extract(&tree, source);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "add");
        assert_eq!(result.symbols[0].kind.as_str(), "function");
    }

    #[test]
    fn class_methods_get_class_parent_and_export() {
        let source = "export class Foo {\n  bar() {}\n}";
        let tree = parse_js(source);
        let result = TypeScriptExtractor.extract(&tree, source);
        let class = result.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert!(class.exported);
        let method = result.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(method.parent_name.as_deref(), Some("Foo"));
        assert!(method.exported);
    }

    #[test]
    fn interface_and_type_alias_are_extracted() {
        let source = "interface Foo { x: number }\ntype Bar = string;";
        let tree = parse_ts(source);
        let result = TypeScriptExtractor.extract(&tree, source);
        assert!(result.symbols.iter().any(|s| s.name == "Foo" && s.kind.as_str() == "interface"));
        assert!(result.symbols.iter().any(|s| s.name == "Bar" && s.kind.as_str() == "type"));
    }

    #[test]
    fn import_statement_collects_named_imports() {
        let source = "import { foo, bar as baz } from \"./b.js\";";
        let tree = parse_js(source);
        let result = TypeScriptExtractor.extract(&tree, source);
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source, "./b.js");
        assert_eq!(result.imports[0].imported_names, vec!["foo", "baz"]);
    }
}
