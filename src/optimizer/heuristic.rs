//! Frequent-Neighbours reordering.

use std::collections::HashSet;

use crate::catalog::ByteIdentifier;

use super::TransitionGraph;

/// Greedy walk over `graph` producing a permutation of its nodes.
///
/// Starts at the heaviest node and keeps following the best unvisited
/// successor; at a dead end it jumps to the heaviest unvisited node.
pub fn heuristic_reorder(graph: &TransitionGraph) -> Vec<ByteIdentifier> {
    let mut order = Vec::with_capacity(graph.len());
    let mut visited = HashSet::with_capacity(graph.len());

    // Heaviest first; nodes only ever become visited, so a single pass suffices
    let mut ranked = graph.nodes().iter();
    let mut current = ranked.next();

    while let Some(node) = current {
        visited.insert(node.name);
        order.push(node.name);

        current = node
            .successors
            .iter()
            .find(|s| !visited.contains(*s))
            .and_then(|s| graph.node(s))
            .or_else(|| ranked.find(|n| !visited.contains(&n.name)));
    }

    order
}
