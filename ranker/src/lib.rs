//! Power-iteration PageRank over the symbol graph (`spec.md` §4.6).
//!
//! Grounded on `mylinyuzhi-codex::retrieval::repomap::pagerank::PageRanker`'s
//! dangling-aware power iteration over a `petgraph::DiGraph`; the teacher
//! runs a variable number of iterations to a convergence tolerance and
//! sum-normalizes file-level personalized ranks, neither of which the spec
//! calls for. Here the iteration count is fixed at 20, dangling mass is
//! redistributed uniformly over every node (not just the personalization
//! vector), and the result is max-normalized so scores land in `[0,1]`.
//!
//! Edge weight (`calls`=1.0 vs `imports`=0.5, per `spec.md` §4.5) plays no
//! part in the iteration itself: §4.6 splits a node's rank mass evenly by
//! plain out-degree ("score/out-degree"), with weight appearing nowhere in
//! that formula. A node with one `calls` edge and one `imports` edge still
//! sends half its mass down each.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rk_metadata_store::GraphEdgeRecord;
use std::collections::HashMap;

const DAMPING: f64 = 0.85;
const ITERATIONS: usize = 20;

/// Run PageRank over `symbol_ids` (every symbol currently known, including
/// isolated ones) and `edges` (source/target symbol ids with a weight),
/// returning a map from symbol id to an importance score in `[0,1]`.
pub fn rank_symbols(symbol_ids: &[i64], edges: &[GraphEdgeRecord]) -> HashMap<i64, f64> {
    let n = symbol_ids.len();
    if n == 0 {
        return HashMap::new();
    }

    let mut graph: DiGraph<i64, f64> = DiGraph::with_capacity(n, edges.len());
    let mut node_of: HashMap<i64, NodeIndex> = HashMap::with_capacity(n);
    for &id in symbol_ids {
        node_of.insert(id, graph.add_node(id));
    }
    for edge in edges {
        if let (Some(&s), Some(&t)) = (
            node_of.get(&edge.source_symbol_id),
            node_of.get(&edge.target_symbol_id),
        ) {
            graph.add_edge(s, t, edge.weight);
        }
    }

    let initial = 1.0 / n as f64;
    let mut scores: HashMap<NodeIndex, f64> =
        graph.node_indices().map(|idx| (idx, initial)).collect();

    let mut out_degree: HashMap<NodeIndex, usize> = HashMap::with_capacity(n);
    for idx in graph.node_indices() {
        out_degree.insert(idx, graph.edges(idx).count());
    }

    for _ in 0..ITERATIONS {
        let dangling_mass: f64 = graph
            .node_indices()
            .filter(|idx| out_degree.get(idx).copied().unwrap_or(0) == 0)
            .map(|idx| scores.get(&idx).copied().unwrap_or(initial))
            .sum();
        let dangling_share = dangling_mass / n as f64;

        let mut next: HashMap<NodeIndex, f64> = HashMap::with_capacity(n);
        for idx in graph.node_indices() {
            let mut incoming = 0.0_f64;
            for edge in graph.edges_directed(idx, Direction::Incoming) {
                let source = edge.source();
                let source_out = out_degree.get(&source).copied().unwrap_or(0);
                if source_out > 0 {
                    let source_score = scores.get(&source).copied().unwrap_or(initial);
                    incoming += source_score / source_out as f64;
                }
            }
            let new_score = (1.0 - DAMPING) / n as f64 + DAMPING * (incoming + dangling_share);
            next.insert(idx, new_score);
        }
        scores = next;
    }

    let max = scores.values().cloned().fold(0.0_f64, f64::max);
    let normalized: HashMap<NodeIndex, f64> = if max > 0.0 {
        scores.into_iter().map(|(idx, s)| (idx, s / max)).collect()
    } else {
        scores
    };

    normalized
        .into_iter()
        .map(|(idx, score)| (graph[idx], score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_metadata_store::EdgeType;

    fn edge(source: i64, target: i64, weight: f64) -> GraphEdgeRecord {
        GraphEdgeRecord {
            id: 0,
            source_symbol_id: source,
            target_symbol_id: target,
            edge_type: EdgeType::Calls.as_str().to_string(),
            weight,
            source_file_id: 0,
            target_file_id: 0,
        }
    }

    #[test]
    fn empty_graph_yields_empty_scores() {
        let scores = rank_symbols(&[], &[]);
        assert!(scores.is_empty());
    }

    #[test]
    fn single_node_normalizes_to_one() {
        let scores = rank_symbols(&[1], &[]);
        assert!((scores[&1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn referenced_symbol_outranks_the_referencer() {
        let scores = rank_symbols(&[1, 2], &[edge(1, 2, 1.0)]);
        assert!(scores[&2] > scores[&1]);
    }

    #[test]
    fn max_score_is_always_one() {
        let scores = rank_symbols(&[1, 2, 3], &[edge(1, 2, 1.0), edge(2, 3, 0.5)]);
        let max = scores.values().cloned().fold(0.0_f64, f64::max);
        assert!((max - 1.0).abs() < 1e-9);
        for &v in scores.values() {
            assert!(v >= 0.0 && v <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn dangling_mass_is_redistributed_not_lost() {
        // 1 -> 2, 2 has no outgoing edges (dangling). Total rank mass
        // should stay conserved rather than leaking away each iteration.
        let scores = rank_symbols(&[1, 2], &[edge(1, 2, 1.0)]);
        assert!(scores[&2] > 0.0);
    }

    #[test]
    fn rank_mass_splits_by_out_degree_not_edge_weight() {
        // 1 has a `calls` edge (weight 1.0) to 2 and an `imports` edge
        // (weight 0.5) to 3; §4.6 splits by out-degree alone, so 2 and 3
        // should receive identical mass from 1 despite the weight skew.
        let edges = vec![edge(1, 2, 1.0), edge(1, 3, 0.5)];
        let scores = rank_symbols(&[1, 2, 3], &edges);
        assert!((scores[&2] - scores[&3]).abs() < 1e-9);
    }
}
