//! Go symbol extraction: function/method declarations, type declarations
//! (specialized by underlying struct/interface/other), and import specs.

use crate::support::{col_range, line_range, node_text, preceding_doc_comment, truncate_signature};
use crate::{ExtractionResult, ImportDeclaration, Symbol, SymbolExtractor, SymbolKind};
use tree_sitter::{Node, Tree};

pub struct GoExtractor;

impl SymbolExtractor for GoExtractor {
    fn extract(&self, tree: &Tree, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            walk(&child, source, &mut result);
        }
        result
    }
}

fn walk(node: &Node, source: &str, out: &mut ExtractionResult) {
    match node.kind() {
        "function_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                push_symbol(out, node, source, &name, SymbolKind::Function, None);
            }
        }
        "method_declaration" => {
            if let Some(name) = field_text(node, "name", source) {
                let receiver = receiver_type_name(node, source);
                push_symbol(out, node, source, &name, SymbolKind::Method, receiver.as_deref());
            }
        }
        "type_declaration" => {
            let mut cursor = node.walk();
            for spec in node.children(&mut cursor) {
                if spec.kind() == "type_spec" {
                    push_type_spec(out, &spec, source);
                }
            }
        }
        "import_declaration" => {
            extract_imports(node, source, out);
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(&child, source, out);
            }
        }
    }
}

fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| node_text(source, &n).to_string())
}

/// Receiver type name of a method declaration, with pointer (`*T`) and
/// parens stripped.
fn receiver_type_name(node: &Node, source: &str) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for param in receiver.children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(ty) = param.child_by_field_name("type") {
                let text = node_text(source, &ty).trim_start_matches('*').trim();
                return Some(text.to_string());
            }
        }
    }
    None
}

fn push_type_spec(out: &mut ExtractionResult, spec: &Node, source: &str) {
    let Some(name) = field_text(spec, "name", source) else {
        return;
    };
    let kind = match spec.child_by_field_name("type").map(|n| n.kind()) {
        Some("struct_type") => SymbolKind::Class,
        Some("interface_type") => SymbolKind::Interface,
        _ => SymbolKind::Type,
    };
    push_symbol(out, spec, source, &name, kind, None);
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
        exported: name.chars().next().is_some_and(char::is_uppercase),
        body: raw.to_string(),
    });
}

fn extract_imports(node: &Node, source: &str, out: &mut ExtractionResult) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_spec" => push_import_spec(&child, source, out),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        push_import_spec(&spec, source, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_import_spec(spec: &Node, source: &str, out: &mut ExtractionResult) {
    let Some(path_node) = spec.child_by_field_name("path") else {
        return;
    };
    let path = strip_quotes(node_text(source, &path_node));
    let alias = spec
        .child_by_field_name("name")
        .map(|n| node_text(source, &n).to_string())
        .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(&path).to_string());
    out.imports.push(ImportDeclaration {
        source: path,
        imported_names: vec![alias],
    });
}

fn strip_quotes(raw: &str) -> String {
    let t = raw.trim();
    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        t[1..t.len() - 1].to_string()
    } else {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn exported_function_detected_by_case() {
        let source = "package main\n\nfunc Foo() int {\n\treturn 1\n}\n";
        let tree = parse(source);
        let result = GoExtractor.extract(&tree, source);
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "Foo");
        assert!(result.symbols[0].exported);
    }

    #[test]
    fn method_gets_receiver_type_as_parent() {
        let source = "package main\n\ntype T struct{}\n\nfunc (t *T) Bar() {}\n";
        let tree = parse(source);
        let result = GoExtractor.extract(&tree, source);
        let method = result.symbols.iter().find(|s| s.name == "Bar").unwrap();
        assert_eq!(method.parent_name.as_deref(), Some("T"));
        let ty = result.symbols.iter().find(|s| s.name == "T").unwrap();
        assert_eq!(ty.kind.as_str(), "class");
    }

    #[test]
    fn interface_type_is_recognized() {
        let source = "package main\n\ntype Reader interface {\n\tRead() error\n}\n";
        let tree = parse(source);
        let result = GoExtractor.extract(&tree, source);
        assert_eq!(result.symbols[0].kind.as_str(), "interface");
    }

    #[test]
    fn import_spec_list_is_flattened() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n";
        let tree = parse(source);
        let result = GoExtractor.extract(&tree, source);
        assert_eq!(result.imports.len(), 2);
        assert!(result.imports.iter().any(|i| i.source == "fmt"));
        assert!(result.imports.iter().any(|i| i.source == "os"));
    }
}
