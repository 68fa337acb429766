//! Transition Graph
//!
//! Per-record read counts and most frequent next reads, rebuilt from the
//! access log on every optimizer run.

use std::collections::HashMap;

use crate::access_log::AccessEvent;
use crate::catalog::ByteIdentifier;

/// Successors kept per node
pub const MAX_SUCCESSORS: usize = 3;

/// One stored record's access statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: ByteIdentifier,
    /// Log events referencing this record
    pub total_weight: u64,
    /// Distinct records read right after this one, most frequent first
    pub successors: Vec<ByteIdentifier>,
}

/// Transition statistics for every stored record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionGraph {
    /// Ranked by descending weight; equal weights keep catalog order
    nodes: Vec<GraphNode>,
    /// Name → position in `nodes`
    index: HashMap<ByteIdentifier, usize>,
}

impl TransitionGraph {
    /// Build the graph for `known` (in catalog order) from `events`.
    ///
    /// Events for names that are not stored are ignored, and so are
    /// transitions into them. Repeated reads of the same record add weight
    /// but no edge. Successor ties keep first-seen order.
    pub fn build(events: &[AccessEvent], known: &[ByteIdentifier]) -> Self {
        let position: HashMap<ByteIdentifier, usize> =
            known.iter().enumerate().map(|(i, name)| (*name, i)).collect();

        let ids: Vec<Option<usize>> = events
            .iter()
            .map(|e| position.get(&ByteIdentifier::new(&e.name)).copied())
            .collect();

        let mut weights = vec![0u64; known.len()];
        // Per node: (successor, count) in first-seen order
        let mut edges: Vec<Vec<(usize, u64)>> = vec![Vec::new(); known.len()];

        for (i, current) in ids.iter().enumerate() {
            let Some(current) = *current else {
                continue;
            };
            weights[current] += 1;

            let Some(Some(next)) = ids.get(i + 1).copied() else {
                continue;
            };
            if next == current {
                continue;
            }
            match edges[current].iter_mut().find(|(s, _)| *s == next) {
                Some((_, count)) => *count += 1,
                None => edges[current].push((next, 1)),
            }
        }

        let mut nodes: Vec<GraphNode> = known
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut candidates = std::mem::take(&mut edges[i]);
                // Stable: ties stay in first-seen order
                candidates.sort_by(|a, b| b.1.cmp(&a.1));
                GraphNode {
                    name: *name,
                    total_weight: weights[i],
                    successors: candidates
                        .into_iter()
                        .take(MAX_SUCCESSORS)
                        .map(|(s, _)| known[s])
                        .collect(),
                }
            })
            .collect();
        nodes.sort_by(|a, b| b.total_weight.cmp(&a.total_weight));

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name, i))
            .collect();

        Self { nodes, index }
    }

    /// Nodes, heaviest first
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, name: &ByteIdentifier) -> Option<&GraphNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Most frequent next read after `name`
    pub fn top_successor(&self, name: &ByteIdentifier) -> Option<ByteIdentifier> {
        self.node(name)?.successors.first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Log events that referenced a stored record
    pub fn total_weight(&self) -> u64 {
        self.nodes.iter().map(|n| n.total_weight).sum()
    }

    /// Whether the log said anything about the stored records
    pub fn has_history(&self) -> bool {
        self.total_weight() > 0
    }
}
