//! Optimizer Module
//!
//! Derives record layouts and prefetch hints from the access log.
//!
//! ## Responsibilities
//! - Build a per-record transition graph (read counts + likely next reads)
//! - Frequent-Neighbours: greedy walk producing a new record order
//! - Next-Potential-Caching: keep the graph live to feed the prefetch queue
//!
//! ## Example
//! ```text
//! log:    a b a b c a b
//! graph:  a (3) -> [b]      b (3) -> [a, c]      c (1) -> [a]
//! order:  a b c
//! ```

mod graph;
mod heuristic;

use std::fmt;

pub use graph::{GraphNode, TransitionGraph, MAX_SUCCESSORS};
pub use heuristic::heuristic_reorder;

/// Optimization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeMode {
    /// Reorder the container so co-accessed records sit next to each other
    FrequentNeighbours,

    /// Leave the file alone; prefetch each fetch's likely successor
    NextPotentialCaching,
}

impl OptimizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizeMode::FrequentNeighbours => "frequent-neighbours",
            OptimizeMode::NextPotentialCaching => "next-potential-caching",
        }
    }
}

impl fmt::Display for OptimizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
