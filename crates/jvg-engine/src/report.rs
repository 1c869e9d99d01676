use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use jvg_symbolic::SymbolicAlgebra;
use serde::Serialize;

use crate::context::GameContext;
use crate::game::{GameMemo, JusticeInfo};
use crate::graph::{Invariant, Jvg, JvgNode, NodeId, NodeKindTag};
use crate::options::BuildOptions;

/// JSON schema version of [`JvgReport`].
pub const JVG_REPORT_SCHEMA_VERSION: u32 = 1;

/// One concrete state, variable name to value name, in registry order.
pub type StateSample = IndexMap<String, String>;

#[derive(Debug, Clone, Serialize)]
pub struct AssumptionNodeReport {
    pub row: usize,
    pub assumption: String,
    pub state_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssumptionReport {
    pub nodes: Vec<AssumptionNodeReport>,
    pub edges: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub kind: NodeKindTag,
    pub rank: Option<usize>,
    /// Id of the system justice the node's rank keeps violated.
    pub violated_justice: Option<String>,
    pub state_count: u64,
    pub sample_states: Vec<StateSample>,
    pub invariants: Vec<Invariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<AssumptionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeReport {
    pub from: NodeId,
    pub to: NodeId,
    pub invariants: Vec<Invariant>,
}

/// Machine-readable summary of a built graph.
#[derive(Debug, Clone, Serialize)]
pub struct JvgReport {
    /// Schema version for machine-readable consumers.
    pub schema_version: u32,
    /// True when no initial state is winning for the environment; the
    /// graph is then empty.
    pub realizable: bool,
    pub options: BuildOptions,
    pub env_justices: Vec<JusticeInfo>,
    pub sys_justices: Vec<JusticeInfo>,
    pub totals: BTreeMap<NodeKindTag, usize>,
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<EdgeReport>,
}

impl JvgReport {
    /// Summarize `jvg`, listing at most `sample_limit` states per node.
    pub fn from_graph<A: SymbolicAlgebra>(
        ctx: &GameContext<'_, A>,
        jvg: &Jvg<A::Set>,
        options: &BuildOptions,
        sample_limit: usize,
    ) -> Self {
        let nodes: Vec<NodeReport> = jvg
            .nodes()
            .map(|node| node_report(ctx, node, sample_limit))
            .collect();
        let mut totals = BTreeMap::new();
        for node in &nodes {
            *totals.entry(node.kind).or_insert(0) += 1;
        }
        let edges = jvg
            .edges()
            .map(|edge| EdgeReport {
                from: edge.from,
                to: edge.to,
                invariants: edge.invariants.clone(),
            })
            .collect();
        Self {
            schema_version: JVG_REPORT_SCHEMA_VERSION,
            realizable: false,
            options: *options,
            env_justices: ctx.game.env_justices.clone(),
            sys_justices: ctx.game.sys_justices.clone(),
            totals,
            nodes,
            edges,
        }
    }

    /// The empty report of a game the environment does not win.
    pub fn realizable<S>(game: &GameMemo<S>, options: &BuildOptions) -> Self {
        Self {
            schema_version: JVG_REPORT_SCHEMA_VERSION,
            realizable: true,
            options: *options,
            env_justices: game.env_justices.clone(),
            sys_justices: game.sys_justices.clone(),
            totals: BTreeMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeReport> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

fn node_report<A: SymbolicAlgebra>(
    ctx: &GameContext<'_, A>,
    node: &JvgNode<A::Set>,
    sample_limit: usize,
) -> NodeReport {
    let alg = ctx.alg;
    let registry = alg.registry();
    let vars = ctx.state_vars();
    let states = ctx.strip(&node.states);
    let sample_states: Vec<StateSample> = alg
        .enumerate(&states, &vars, sample_limit)
        .into_iter()
        .map(|values| {
            vars.iter()
                .zip(values)
                .map(|(var, value)| {
                    (
                        registry.name(*var).to_string(),
                        registry.value_name(*var, value).to_string(),
                    )
                })
                .collect::<StateSample>()
        })
        .collect();
    let violated_justice = node
        .rank
        .and_then(|rank| ctx.game.violated_justice(rank))
        .and_then(|j| ctx.game.sys_justices.get(j))
        .map(|justice| justice.id.clone());
    let assumptions = node.assumptions().map(|graph| AssumptionReport {
        nodes: graph
            .nodes
            .values()
            .map(|n| AssumptionNodeReport {
                row: n.row,
                assumption: n.assumption.id.clone(),
                state_count: alg.count(&n.states, &vars),
            })
            .collect(),
        edges: graph.edges.iter().copied().collect(),
    });
    NodeReport {
        id: node.id,
        kind: node.kind.tag(),
        rank: node.rank,
        violated_justice,
        state_count: alg.count(&states, &vars),
        sample_states,
        invariants: node.invariants.clone(),
        assumptions,
    }
}

impl fmt::Display for JvgReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "JUSTICE VIOLATION GRAPH")?;
        writeln!(f, "Schema version: {}", self.schema_version)?;
        if self.realizable {
            return writeln!(f, "Specification is realizable: no justice violation graph");
        }
        writeln!(f, "Nodes: {}, edges: {}", self.nodes.len(), self.edges.len())?;
        for (kind, count) in &self.totals {
            writeln!(f, "  {kind:?}: {count}")?;
        }
        for node in &self.nodes {
            let rank = node
                .rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".into());
            write!(
                f,
                "  {} {:?} rank={} states={}",
                node.id, node.kind, rank, node.state_count
            )?;
            if let Some(justice) = &node.violated_justice {
                write!(f, " violates={justice}")?;
            }
            writeln!(f)?;
            if !node.invariants.is_empty() {
                let invariants: Vec<String> = node.invariants.iter().map(ToString::to_string).collect();
                writeln!(f, "    invariants: {}", invariants.join(", "))?;
            }
            if let Some(assumptions) = &node.assumptions {
                let order: Vec<String> = assumptions
                    .edges
                    .iter()
                    .map(|(from, to)| format!("{from}->{to}"))
                    .collect();
                writeln!(
                    f,
                    "    assumptions: {} groups, order [{}]",
                    assumptions.nodes.len(),
                    order.join(", ")
                )?;
            }
        }
        for edge in &self.edges {
            writeln!(f, "  {} -> {}", edge.from, edge.to)?;
        }
        Ok(())
    }
}
