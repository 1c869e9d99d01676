use serde::{Deserialize, Serialize};

/// Knobs for one graph construction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Build an assumption-satisfaction subgraph for every cycle node.
    pub assumption_graphs: bool,
    /// Annotate nodes and edges with invariants after construction.
    pub invariants: bool,
    /// Collapse single-path attractor chains after construction.
    pub merge_attractors: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            assumption_graphs: true,
            invariants: true,
            merge_attractors: false,
        }
    }
}
