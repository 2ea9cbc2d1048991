//! Reciprocal-rank fusion and overlap-based deduplication (`spec.md` §4.7).
//!
//! Grounded on `codex_rs_retrieval::search::fusion::fuse_all_results`'
//! per-source, per-rank accumulation; rewritten around this crate's
//! `"path:start-end"` key/`SearchResult` shape rather than `ScoreType`-tagged
//! chunk rows, since the teacher's fusion keys on row id, not line range.

use std::collections::HashMap;

use crate::types::SearchResult;

pub const RRF_K: f64 = 60.0;

struct Accumulated {
    result: SearchResult,
    score: f64,
}

/// Fuse any number of already-ranked sources, each carrying its own fusion
/// weight. Rank `r` (0-based) in a source of weight `w` contributes
/// `w/(k+r+1)` to that result's fused score; duplicate keys across sources
/// accumulate, keeping the longer-content representative (`spec.md` §4.7).
pub fn reciprocal_rank_fusion(sources: &[(Vec<SearchResult>, f64)]) -> Vec<SearchResult> {
    let mut acc: HashMap<String, Accumulated> = HashMap::new();

    for (results, weight) in sources {
        for (rank, result) in results.iter().enumerate() {
            let contribution = weight / (RRF_K + rank as f64 + 1.0);
            let key = result.fusion_key();
            match acc.get_mut(&key) {
                Some(entry) => {
                    entry.score += contribution;
                    if result.content.len() > entry.result.content.len() {
                        entry.result = result.clone();
                    }
                }
                None => {
                    acc.insert(
                        key,
                        Accumulated {
                            result: result.clone(),
                            score: contribution,
                        },
                    );
                }
            }
        }
    }

    let mut fused: Vec<SearchResult> = acc
        .into_values()
        .map(|a| SearchResult { score: a.score, ..a.result })
        .collect();
    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

/// Iterate in score-sorted order, dropping any result whose
/// `(filePath, startLine..endLine)` interval overlaps one already kept.
pub fn deduplicate_by_overlap(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut kept: Vec<SearchResult> = Vec::with_capacity(results.len());
    for result in results {
        if kept.iter().any(|k| k.overlaps(&result)) {
            continue;
        }
        kept.push(result);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchType;

    fn result(path: &str, start: i64, end: i64, content: &str) -> SearchResult {
        SearchResult {
            file_path: path.to_string(),
            start_line: start,
            end_line: end,
            content: content.to_string(),
            score: 0.0,
            match_type: MatchType::Vector,
            symbols: Vec::new(),
            language: None,
        }
    }

    #[test]
    fn fusion_score_matches_literal_formula() {
        // document D at rank 0 in vector (weight 0.5), rank 2 in keyword
        // (weight 0.3), absent from symbol (spec.md §8 scenario 5).
        let d = result("a.ts", 1, 10, "content");
        let vector = vec![d.clone()];
        let keyword = vec![
            result("x.ts", 1, 5, "x"),
            result("y.ts", 1, 5, "y"),
            d.clone(),
        ];
        let fused = reciprocal_rank_fusion(&[(vector, 0.5), (keyword, 0.3)]);
        let hit = fused.iter().find(|r| r.file_path == "a.ts").unwrap();
        let expected = 0.5 / (RRF_K + 0.0 + 1.0) + 0.3 / (RRF_K + 2.0 + 1.0);
        assert!((hit.score - expected).abs() < 1e-12, "{} vs {}", hit.score, expected);
    }

    #[test]
    fn dedup_drops_overlapping_interval_in_same_file() {
        let results = vec![
            result("a.ts", 1, 20, "first"),
            result("a.ts", 10, 15, "overlaps first"),
            result("b.ts", 1, 20, "different file"),
        ];
        let deduped = deduplicate_by_overlap(results);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].file_path, "a.ts");
        assert_eq!(deduped[1].file_path, "b.ts");
    }

    #[test]
    fn dedup_keeps_non_overlapping_ranges_in_same_file() {
        let results = vec![result("a.ts", 1, 10, "one"), result("a.ts", 11, 20, "two")];
        let deduped = deduplicate_by_overlap(results);
        assert_eq!(deduped.len(), 2);
    }
}
