//! Token-budget enforcement (`spec.md` §4.7): applied by the caller that
//! formats output, not by `search` itself — exposed here as a pure function
//! so the external formatting adaptor (out of core scope) and this crate's
//! tests share one implementation.

use crate::types::SearchResult;

const RESULT_OVERHEAD_TOKENS: usize = 20;
const TRUNCATION_TAIL_MIN_REMAINING: usize = 100;

/// Same estimate as `rk-chunking`'s chunk sizing: `⌈len(text)/3.5⌉`.
pub fn estimate_tokens(text: &str) -> usize {
    ((text.len() as f64) / 3.5).ceil() as usize
}

/// Walk `results` in order, adding each result's estimated tokens plus a
/// 20-token overhead. If the next result would overflow the budget: include
/// a truncated version when more than 100 tokens remain (first `3*remaining`
/// characters plus a truncation marker), otherwise stop.
pub fn apply_token_budget(results: Vec<SearchResult>, token_budget: usize) -> Vec<SearchResult> {
    let mut out = Vec::with_capacity(results.len());
    let mut spent = 0usize;

    for result in results {
        let cost = estimate_tokens(&result.content) + RESULT_OVERHEAD_TOKENS;
        if spent + cost <= token_budget {
            spent += cost;
            out.push(result);
            continue;
        }

        let remaining = token_budget.saturating_sub(spent);
        if remaining > TRUNCATION_TAIL_MIN_REMAINING {
            let char_budget = 3 * remaining;
            let truncated_content: String = result.content.chars().take(char_budget).collect();
            out.push(SearchResult {
                content: format!("{truncated_content}\n// ... (truncated)"),
                ..result
            });
        }
        break;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchType;

    fn result(content: &str) -> SearchResult {
        SearchResult {
            file_path: "a.ts".to_string(),
            start_line: 1,
            end_line: 1,
            content: content.to_string(),
            score: 1.0,
            match_type: MatchType::Vector,
            symbols: Vec::new(),
            language: None,
        }
    }

    #[test]
    fn ten_large_results_retain_at_most_two_plus_truncated_tail() {
        // 800-token results, budget 2000 (spec.md §8 scenario 6).
        let content = "x".repeat(800 * 4);
        let results: Vec<_> = (0..10).map(|_| result(&content)).collect();
        let out = apply_token_budget(results, 2000);

        assert!(out.len() <= 3);
        let total: usize = out.iter().map(|r| estimate_tokens(&r.content) + 20).collect::<Vec<_>>().iter().sum();
        // the truncated tail may itself carry the marker's extra bytes, but
        // it is sized against the remaining budget, not the full content.
        assert!(total <= 2000 + 100, "total={total}");
    }

    #[test]
    fn small_results_all_fit_untruncated() {
        let results: Vec<_> = (0..3).map(|_| result("short")).collect();
        let out = apply_token_budget(results, 2000);
        assert_eq!(out.len(), 3);
        assert!(!out[2].content.contains("truncated"));
    }
}
