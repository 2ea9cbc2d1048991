//! Symbol-boundary-aware chunking: packs a file's source into token-budgeted
//! chunks that try hard not to cut a function or class in half.
//!
//! Reworked from `codegraph_prep::core::chunking`'s single AST-node-per-chunk
//! stub into the region-sequence packing algorithm: whole-file fast path,
//! then alternating gap/symbol regions sorted by line, each either emitted
//! whole or greedily line-sliced to the token budget.

use rk_symbols::Symbol;

/// Header overhead reserved out of every chunk's token budget.
const HEADER_OVERHEAD_TOKENS: usize = 20;

#[derive(Debug, Clone)]
pub struct Chunk {
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub symbol_names: Vec<String>,
    /// Chunk text, including the leading `// File: ...` header line.
    pub text: String,
    pub token_estimate: usize,
}

/// `⌈len(text)/3.5⌉`.
pub fn estimate_tokens(text: &str) -> usize {
    ((text.len() as f64) / 3.5).ceil() as usize
}

fn header_line(path: &str, start_line: usize, end_line: usize, symbol_names: &[String]) -> String {
    if symbol_names.is_empty() {
        format!("// File: {path} | Lines: {start_line}-{end_line}")
    } else {
        format!(
            "// File: {path} | Lines: {start_line}-{end_line} | Symbols: {}",
            symbol_names.join(", ")
        )
    }
}

fn make_chunk(path: &str, lines: &[&str], start_line: usize, end_line: usize, symbol_names: Vec<String>) -> Chunk {
    let header = header_line(path, start_line, end_line, &symbol_names);
    let body = lines.join("\n");
    let text = format!("{header}\n{body}");
    let token_estimate = estimate_tokens(&text);
    Chunk {
        path: path.to_string(),
        start_line,
        end_line,
        symbol_names,
        text,
        token_estimate,
    }
}

#[tracing::instrument(level = "debug", skip(source, symbols))]
pub fn chunk_file(path: &str, source: &str, symbols: &[Symbol], max_tokens: usize) -> Vec<Chunk> {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }
    // Step 1: whole-file fast path. Compared against the full budget, not
    // the header-reserved one below; the header overhead is only charged
    // against region splitting in step 4 (`spec.md` §4.3).
    if estimate_tokens(source) <= max_tokens {
        let names: Vec<String> = symbols.iter().map(|s| s.name.clone()).collect();
        return vec![make_chunk(path, &lines, 1, lines.len(), names)];
    }

    let budget = max_tokens.saturating_sub(HEADER_OVERHEAD_TOKENS).max(1);

    // Step 2: top-level symbols (no parent) and classes, sorted, non-overlapping.
    let mut selected: Vec<&Symbol> = symbols
        .iter()
        .filter(|s| s.parent_name.is_none() || s.kind == rk_symbols::SymbolKind::Class)
        .collect();
    selected.sort_by_key(|s| s.start_line);

    let mut top_level = Vec::new();
    let mut consumed_until = 0usize;
    for sym in selected {
        if sym.start_line <= consumed_until {
            continue;
        }
        top_level.push(sym);
        consumed_until = sym.end_line;
    }

    if top_level.is_empty() {
        return line_sliced(path, &lines, budget);
    }

    // Step 3: build the region sequence.
    let regions = build_regions(&lines, symbols, &top_level);

    // Step 4: emit each region whole if it fits, else line-slice it.
    let mut chunks = Vec::new();
    for region in regions {
        if region.start > region.end {
            continue;
        }
        let region_lines = &lines[region.start - 1..region.end];
        let candidate = make_chunk(path, region_lines, region.start, region.end, region.symbol_names.clone());
        if candidate.token_estimate <= budget {
            chunks.push(candidate);
        } else {
            chunks.extend(line_sliced_range(path, &lines, region.start, region.end, budget));
        }
    }
    chunks
}

struct Region {
    start: usize,
    end: usize,
    symbol_names: Vec<String>,
}

fn build_regions(lines: &[&str], all_symbols: &[Symbol], top_level: &[&Symbol]) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut cursor = 1usize;
    for sym in top_level {
        if sym.start_line > cursor {
            regions.push(Region {
                start: cursor,
                end: sym.start_line - 1,
                symbol_names: Vec::new(),
            });
        }
        let mut names = vec![sym.name.clone()];
        names.extend(
            all_symbols
                .iter()
                .filter(|s| s.parent_name.as_deref() == Some(sym.name.as_str()))
                .map(|s| s.name.clone()),
        );
        regions.push(Region {
            start: sym.start_line,
            end: sym.end_line,
            symbol_names: names,
        });
        cursor = sym.end_line + 1;
    }
    if cursor <= lines.len() {
        regions.push(Region {
            start: cursor,
            end: lines.len(),
            symbol_names: Vec::new(),
        });
    }
    regions
}

/// Greedily pack consecutive lines into chunks up to `budget` tokens each,
/// never splitting a line.
fn line_sliced_range(path: &str, lines: &[&str], from: usize, to: usize, budget: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut slice_start = from;
    let mut acc = String::new();
    for line_no in from..=to {
        let line = lines[line_no - 1];
        let candidate_len = if acc.is_empty() {
            line.len()
        } else {
            acc.len() + 1 + line.len()
        };
        if !acc.is_empty() && estimate_tokens_len(candidate_len) > budget {
            chunks.push(make_chunk(path, &lines[slice_start - 1..line_no - 1], slice_start, line_no - 1, Vec::new()));
            slice_start = line_no;
            acc.clear();
        }
        if !acc.is_empty() {
            acc.push('\n');
        }
        acc.push_str(line);
    }
    if slice_start <= to {
        chunks.push(make_chunk(path, &lines[slice_start - 1..to], slice_start, to, Vec::new()));
    }
    chunks
}

fn estimate_tokens_len(byte_len: usize) -> usize {
    ((byte_len as f64) / 3.5).ceil() as usize
}

fn line_sliced(path: &str, lines: &[&str], budget: usize) -> Vec<Chunk> {
    line_sliced_range(path, lines, 1, lines.len(), budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_symbols::SymbolKind;

    fn sym(name: &str, kind: SymbolKind, start: usize, end: usize, parent: Option<&str>) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            signature: None,
            start_line: start,
            end_line: end,
            start_col: 0,
            end_col: 0,
            parent_name: parent.map(str::to_string),
            docstring: None,
            exported: true,
            body: String::new(),
        }
    }

    #[test]
    fn whole_file_fits_in_one_chunk() {
        let source = "fn a() {}\nfn b() {}\n";
        let symbols = vec![sym("a", SymbolKind::Function, 1, 1, None), sym("b", SymbolKind::Function, 2, 2, None)];
        let chunks = chunk_file("x.rs", source, &symbols, 512);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("// File: x.rs"));
        assert!(chunks[0].text.contains("Symbols: a, b"));
    }

    #[test]
    fn whole_file_fast_path_ignores_header_overhead() {
        // Body estimate falls strictly between `max_tokens - 20` and
        // `max_tokens`; step 1 must compare against the full budget, not
        // the header-reserved one (that deduction only applies in step 4).
        let source = "x".repeat(140);
        let max_tokens = 50;
        assert!(estimate_tokens(&source) > max_tokens - HEADER_OVERHEAD_TOKENS);
        assert!(estimate_tokens(&source) <= max_tokens);
        let chunks = chunk_file("f.rs", &source, &[], max_tokens);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn large_file_splits_by_symbol_regions() {
        let lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
        let mut source = lines.join("\n");
        source.push('\n');
        let symbols = vec![
            sym("Foo", SymbolKind::Class, 5, 15, None),
            sym("bar", SymbolKind::Method, 8, 10, Some("Foo")),
            sym("baz", SymbolKind::Function, 20, 25, None),
        ];
        let chunks = chunk_file("big.rs", &source, &symbols, 10);
        assert!(chunks.len() > 1);
        let foo_chunk = chunks.iter().find(|c| c.symbol_names.contains(&"Foo".to_string()));
        assert!(foo_chunk.is_some());
        assert!(foo_chunk.unwrap().symbol_names.contains(&"bar".to_string()));
    }

    #[test]
    fn no_symbols_falls_back_to_line_slicing() {
        let lines: Vec<String> = (0..20).map(|i| format!("line number {i} with some text")).collect();
        let source = lines.join("\n");
        let chunks = chunk_file("plain.txt", &source, &[], 10);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.token_estimate <= 10);
        }
    }

    #[test]
    fn header_omits_symbols_segment_when_empty() {
        let source = "a\nb\nc\n";
        let chunks = chunk_file("f.txt", source, &[], 512);
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].text.contains("Symbols:"));
    }
}
