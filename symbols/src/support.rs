//! Shared tree-sitter node helpers used by every per-language extractor.
//!
//! The walking style (recurse, track an owner chain, push decls as you go)
//! follows `codegraph_prep::languages::dart::decls::collect_decls`.

use tree_sitter::Node;

pub fn node_text<'a>(source: &'a str, node: &Node) -> &'a str {
    let len = source.len();
    let start = node.start_byte().min(len);
    let end = node.end_byte().min(len).max(start);
    &source[start..end]
}

/// 1-based inclusive line range.
pub fn line_range(node: &Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

pub fn col_range(node: &Node) -> (usize, usize) {
    (node.start_position().column, node.end_position().column)
}

/// Truncate signature text at the first body opener (`{`, `=>`), and
/// optionally at the first newline (used for type-alias-like declarations),
/// bounded to 200 characters.
pub fn truncate_signature(text: &str, stop_at_newline: bool) -> String {
    let mut cut = text.len();
    if let Some(pos) = text.find('{') {
        cut = cut.min(pos);
    }
    if let Some(pos) = text.find("=>") {
        cut = cut.min(pos);
    }
    if stop_at_newline {
        if let Some(pos) = text.find('\n') {
            cut = cut.min(pos);
        }
    }
    let mut sig = text[..cut].trim_end().to_string();
    if sig.chars().count() > 200 {
        sig = sig.chars().take(200).collect();
    }
    sig
}

/// Strip `//`, `///`, `/* */`, `/** */` markers from a single comment node's text.
pub fn strip_comment_markers(raw: &str) -> String {
    let t = raw.trim();
    if let Some(rest) = t.strip_prefix("/**") {
        rest.trim_end_matches("*/").trim().to_string()
    } else if let Some(rest) = t.strip_prefix("/*") {
        rest.trim_end_matches("*/").trim().to_string()
    } else if let Some(rest) = t.strip_prefix("///") {
        rest.trim().to_string()
    } else if let Some(rest) = t.strip_prefix("//") {
        rest.trim().to_string()
    } else if let Some(rest) = t.strip_prefix('#') {
        rest.trim().to_string()
    } else {
        t.to_string()
    }
}

const COMMENT_KINDS: [&str; 3] = ["line_comment", "block_comment", "comment"];

/// The immediately preceding sibling comment node, if any, stripped of its
/// markers.
pub fn preceding_doc_comment(node: &Node, source: &str) -> Option<String> {
    let prev = node.prev_sibling()?;
    if COMMENT_KINDS.contains(&prev.kind()) {
        Some(strip_comment_markers(node_text(source, &prev)))
    } else {
        None
    }
}

/// Find the first descendant of the given kind (depth-first), not crossing
/// into nested declarations of the same kind.
pub fn first_descendant_of_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    if node.kind() == kind {
        return Some(*node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_descendant_of_kind(&child, kind) {
            return Some(found);
        }
    }
    None
}

/// True if any direct child of `node` has the given kind.
pub fn has_child_of_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == kind)
}
