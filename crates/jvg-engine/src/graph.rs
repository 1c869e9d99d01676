//! The justice violation graph produced by the engine.

use std::collections::BTreeMap;

use jvg_symbolic::SymbolicAlgebra;
use serde::Serialize;

use crate::assumptions::AssumptionGraph;
use crate::context::GameContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const INITIAL: NodeId = NodeId(0);
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A `variable = value` fact that holds on every state of a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Invariant {
    pub var: String,
    pub value: String,
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.var, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKindTag {
    Initial,
    Cycle,
    AttractorFromCycle,
    AttractorNotFromCycle,
}

#[derive(Debug)]
pub enum JvgNodeKind<S> {
    /// The initial states; every other node is reachable from it.
    Initial,
    /// States on which the environment keeps satisfying its assumptions
    /// forever while the system justice of the rank stays violated.
    Cycle {
        assumptions: Option<AssumptionGraph<S>>,
    },
    /// States from which the environment forces a lower rank (or a safety
    /// violation).
    AttractorFromCycle,
    /// States on the prefixes of traced paths, leading into a cycle.
    AttractorNotFromCycle,
}

impl<S> JvgNodeKind<S> {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            JvgNodeKind::Initial => NodeKindTag::Initial,
            JvgNodeKind::Cycle { .. } => NodeKindTag::Cycle,
            JvgNodeKind::AttractorFromCycle => NodeKindTag::AttractorFromCycle,
            JvgNodeKind::AttractorNotFromCycle => NodeKindTag::AttractorNotFromCycle,
        }
    }

    pub fn is_attractor(&self) -> bool {
        matches!(
            self,
            JvgNodeKind::AttractorFromCycle | JvgNodeKind::AttractorNotFromCycle
        )
    }
}

#[derive(Debug)]
pub struct JvgNode<S> {
    pub id: NodeId,
    /// `None` for the initial node and for safety-violation nodes.
    pub rank: Option<usize>,
    pub states: S,
    /// Committed environment choices for the node's states.
    pub transitions: S,
    pub invariants: Vec<Invariant>,
    pub kind: JvgNodeKind<S>,
}

impl<S> JvgNode<S> {
    pub fn assumptions(&self) -> Option<&AssumptionGraph<S>> {
        match &self.kind {
            JvgNodeKind::Cycle { assumptions } => assumptions.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvgEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub invariants: Vec<Invariant>,
}

/// Nodes and directed edges, keyed for deterministic iteration.
#[derive(Debug)]
pub struct Jvg<S> {
    nodes: BTreeMap<NodeId, JvgNode<S>>,
    edges: BTreeMap<(NodeId, NodeId), JvgEdge>,
}

impl<S> Default for Jvg<S> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }
}

impl<S> Jvg<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&JvgNode<S>> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut JvgNode<S>> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &JvgNode<S>> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut JvgNode<S>> {
        self.nodes.values_mut()
    }

    pub fn edges(&self) -> impl Iterator<Item = &JvgEdge> {
        self.edges.values()
    }

    pub(crate) fn edges_mut(&mut self) -> impl Iterator<Item = &mut JvgEdge> {
        self.edges.values_mut()
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&JvgEdge> {
        self.edges.get(&(from, to))
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.contains_key(&(from, to))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .range((id, NodeId(0))..=(id, NodeId(usize::MAX)))
            .map(|((_, to), _)| *to)
            .collect()
    }

    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .keys()
            .filter(|(_, to)| *to == id)
            .map(|(from, _)| *from)
            .collect()
    }

    pub fn nodes_of_kind(&self, tag: NodeKindTag) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.kind.tag() == tag)
            .map(|n| n.id)
            .collect()
    }

    /// The next free node id.
    pub(crate) fn next_id(&self) -> NodeId {
        self.nodes
            .keys()
            .next_back()
            .map(|id| NodeId(id.0 + 1))
            .unwrap_or(NodeId::INITIAL)
    }

    pub(crate) fn add_node(&mut self, node: JvgNode<S>) {
        self.nodes.insert(node.id, node);
    }

    /// Add `from -> to` unless present. Self-loops are ignored.
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to || self.edges.contains_key(&(from, to)) {
            return false;
        }
        self.edges.insert(
            (from, to),
            JvgEdge {
                from,
                to,
                invariants: Vec::new(),
            },
        );
        true
    }

    /// Add `from -> to`, or keep only the invariants both edges share when
    /// the edge already exists.
    pub(crate) fn merge_edge(&mut self, from: NodeId, to: NodeId, invariants: Vec<Invariant>) {
        if from == to {
            return;
        }
        match self.edges.get_mut(&(from, to)) {
            Some(edge) => edge.invariants.retain(|inv| invariants.contains(inv)),
            None => {
                self.edges.insert(
                    (from, to),
                    JvgEdge {
                        from,
                        to,
                        invariants,
                    },
                );
            }
        }
    }

    /// Remove a node with its incident edges, returning them.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<(JvgNode<S>, Vec<JvgEdge>)> {
        let node = self.nodes.remove(&id)?;
        let incident: Vec<(NodeId, NodeId)> = self
            .edges
            .keys()
            .filter(|(from, to)| *from == id || *to == id)
            .copied()
            .collect();
        let edges = incident
            .into_iter()
            .filter_map(|key| self.edges.remove(&key))
            .collect();
        Some((node, edges))
    }

    /// Renumber nodes to consecutive ids in their current order.
    pub(crate) fn renumber(&mut self) {
        let mapping: BTreeMap<NodeId, NodeId> = self
            .nodes
            .keys()
            .enumerate()
            .map(|(i, old)| (*old, NodeId(i)))
            .collect();
        let nodes = std::mem::take(&mut self.nodes);
        for (old, mut node) in nodes {
            node.id = mapping[&old];
            self.nodes.insert(node.id, node);
        }
        let edges = std::mem::take(&mut self.edges);
        for (_, mut edge) in edges {
            edge.from = mapping[&edge.from];
            edge.to = mapping[&edge.to];
            self.edges.insert((edge.from, edge.to), edge);
        }
    }
}

impl<S> Jvg<S> {
    /// One-step successors of `node`: every node among its children (and
    /// itself) together with the transitions of `node`, restricted to
    /// `refine`, that land in that node's states.
    ///
    /// For the initial node the pairs carry the initial states that belong
    /// to each child instead of transitions.
    pub fn successors<A>(
        &self,
        ctx: &GameContext<'_, A>,
        node: NodeId,
        refine: &A::Set,
    ) -> Vec<(NodeId, A::Set)>
    where
        A: SymbolicAlgebra<Set = S>,
    {
        let alg = ctx.alg;
        let Some(source) = self.node(node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if node == NodeId::INITIAL {
            let start = alg.and(&ctx.game.ini, refine);
            for child in self.children(node) {
                if let Some(target) = self.node(child) {
                    let part = alg.and(&start, &ctx.strip(&target.states));
                    if !alg.is_empty(&part) {
                        out.push((child, part));
                    }
                }
            }
            return out;
        }
        let steps = alg.and(
            &alg.and(&source.transitions, refine),
            &ctx.game.sys_trans,
        );
        let mut targets = vec![node];
        targets.extend(self.children(node));
        for target_id in targets {
            if let Some(target) = self.node(target_id) {
                let landing = alg.and(&steps, &alg.prime(&ctx.strip(&target.states)));
                if !alg.is_empty(&landing) {
                    out.push((target_id, landing));
                }
            }
        }
        out
    }
}
