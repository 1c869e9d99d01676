//! Ranking graph: the rank layers of the memo refined into disjoint nodes.

use std::collections::BTreeMap;

use jvg_symbolic::SymbolicAlgebra;
use serde::Serialize;
use tracing::debug;

use crate::context::GameContext;
use crate::error::{BuildError, InvariantViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RgNodeId(pub usize);

impl RgNodeId {
    /// The initial marker node. It holds no states; its edges point at the
    /// rank nodes that intersect the states reachable from the initial set.
    pub const MARKER: RgNodeId = RgNodeId(0);
}

#[derive(Debug)]
pub struct RgNode<S> {
    pub id: RgNodeId,
    /// Rank index. The marker carries the number of ranks, above every
    /// real rank.
    pub rank: usize,
    pub is_initial: bool,
    pub states: S,
}

#[derive(Debug)]
pub struct RankingGraph<S> {
    nodes: Vec<RgNode<S>>,
    edges: BTreeMap<RgNodeId, Vec<RgNodeId>>,
    by_rank: BTreeMap<usize, RgNodeId>,
}

impl<S> RankingGraph<S> {
    pub fn node(&self, id: RgNodeId) -> Option<&RgNode<S>> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RgNode<S>> {
        self.nodes.iter()
    }

    /// Rank nodes, excluding the marker.
    pub fn rank_nodes(&self) -> impl Iterator<Item = &RgNode<S>> {
        self.nodes.iter().filter(|n| !n.is_initial)
    }

    pub fn node_of_rank(&self, rank: usize) -> Option<RgNodeId> {
        self.by_rank.get(&rank).copied()
    }

    pub fn edges_from(&self, id: RgNodeId) -> &[RgNodeId] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn marker_targets(&self) -> &[RgNodeId] {
        self.edges_from(RgNodeId::MARKER)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Build the ranking graph of the memo behind `ctx`.
    ///
    /// Fails with [`BuildError::Realizable`] when no rank intersects the
    /// states reachable from the initial set.
    pub fn build<A>(ctx: &GameContext<'_, A>) -> Result<Self, BuildError>
    where
        A: SymbolicAlgebra<Set = S>,
    {
        let alg = ctx.alg;
        let game = ctx.game;
        let num_ranks = game.z.len();

        let mut refined = Vec::with_capacity(num_ranks);
        let mut below = alg.empty();
        for layer in &game.z {
            refined.push(alg.and_not(layer, &below));
            below = alg.or(&below, layer);
        }

        let mut graph = RankingGraph {
            nodes: vec![RgNode {
                id: RgNodeId::MARKER,
                rank: num_ranks,
                is_initial: true,
                states: alg.empty(),
            }],
            edges: BTreeMap::new(),
            by_rank: BTreeMap::new(),
        };

        let reachable = ctx.reach_within(&game.ini, &alg.universe());
        let mut marker_ranks = Vec::new();
        for rank in (0..num_ranks).rev() {
            if alg.is_empty(&refined[rank]) {
                continue;
            }
            let id = RgNodeId(graph.nodes.len());
            graph.by_rank.insert(rank, id);
            if alg.intersects(&refined[rank], &reachable) {
                marker_ranks.push(rank);
            }
            let states = alg.share(&refined[rank]);
            graph.nodes.push(RgNode {
                id,
                rank,
                is_initial: false,
                states,
            });
        }
        if marker_ranks.is_empty() {
            return Err(BuildError::Realizable);
        }
        // marker edges were collected by rank; resolve them to node ids
        let marker_edges = marker_ranks
            .iter()
            .filter_map(|rank| graph.by_rank.get(rank).copied())
            .collect();
        graph.edges.insert(RgNodeId::MARKER, marker_edges);

        let mut allowed = alg.empty();
        let mut order: Vec<(usize, RgNodeId)> =
            graph.by_rank.iter().map(|(r, id)| (*r, *id)).collect();
        order.sort();
        let mut targets_by_node = BTreeMap::new();
        for (rank, id) in order {
            allowed = alg.or(&allowed, &refined[rank]);
            let reach = ctx.reach_within(&refined[rank], &allowed);
            let mut targets = Vec::new();
            for lower in (0..rank).rev() {
                if let Some(target) = graph.by_rank.get(&lower) {
                    if alg.intersects(&refined[lower], &reach) {
                        targets.push(*target);
                    }
                }
            }
            targets_by_node.insert(id, targets);
        }
        graph.edges.extend(targets_by_node);
        graph.check_ranks()?;

        debug!(
            nodes = graph.nodes.len() - 1,
            edges = graph.edge_count(),
            marker_edges = graph.marker_targets().len(),
            "Built ranking graph"
        );
        Ok(graph)
    }

    fn check_ranks(&self) -> Result<(), InvariantViolation> {
        for (from, targets) in &self.edges {
            if *from == RgNodeId::MARKER {
                continue;
            }
            let from_rank = self.nodes[from.0].rank;
            for to in targets {
                let to_rank = self.nodes[to.0].rank;
                if to_rank >= from_rank {
                    return Err(InvariantViolation::RankNotDecreasing {
                        from: from_rank,
                        to: to_rank,
                    });
                }
            }
        }
        Ok(())
    }
}
