//! Assumption-satisfaction subgraphs of cycle nodes.
//!
//! The states of a cycle node are partitioned by the environment justice
//! (row) they are first traced towards. An edge `a -> b` records that a
//! committed step moves from group `a` into group `b`; along a well-formed
//! cycle the rows are entered in order, so every edge goes to the next row.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use jvg_symbolic::SymbolicAlgebra;

use crate::context::GameContext;
use crate::error::InvariantViolation;
use crate::game::JusticeInfo;
use crate::path::TracedPath;

#[derive(Debug)]
pub struct AssumptionNode<S> {
    pub row: usize,
    pub assumption: JusticeInfo,
    /// Cycle states working towards `assumption`, without the row tag.
    pub states: S,
}

#[derive(Debug)]
pub struct AssumptionGraph<S> {
    pub nodes: BTreeMap<usize, AssumptionNode<S>>,
    pub edges: BTreeSet<(usize, usize)>,
}

impl<S> AssumptionGraph<S> {
    pub fn successors(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .range((row, 0)..=(row, usize::MAX))
            .map(|(_, to)| *to)
    }
}

/// Split the concrete `cycle` states into per-row groups and connect the
/// groups through the committed choices in `inner`.
///
/// Cycle points are visited in tracing order, then prefix points; the first
/// point touching an unclaimed part of the cycle claims it for its row, so
/// every concrete state belongs to exactly one group.
pub(crate) fn build_assumption_graph<A: SymbolicAlgebra>(
    ctx: &GameContext<'_, A>,
    rank: usize,
    cycle: &A::Set,
    inner: &A::Set,
    paths: &[TracedPath<A::Set>],
) -> Result<AssumptionGraph<A::Set>, InvariantViolation> {
    let alg = ctx.alg;
    let rows = ctx.num_rows();
    let concrete = ctx.strip(cycle);
    let mut claimed = alg.empty();
    let mut groups: BTreeMap<usize, A::Set> = BTreeMap::new();
    let points = paths
        .iter()
        .flat_map(TracedPath::cycle)
        .chain(paths.iter().flat_map(TracedPath::prefix));
    for point in points {
        let part = alg.and_not(&alg.and(&ctx.strip(&point.states), &concrete), &claimed);
        if alg.is_empty(&part) {
            continue;
        }
        claimed = alg.or(&claimed, &part);
        match groups.entry(point.row) {
            Entry::Occupied(mut entry) => {
                let merged = alg.or(entry.get(), &part);
                entry.insert(merged);
            }
            Entry::Vacant(entry) => {
                entry.insert(part);
            }
        }
    }

    let mut edges = BTreeSet::new();
    for (from, states) in &groups {
        let image = ctx.strip(&ctx.image(&alg.and(cycle, states), inner));
        for (to, target) in &groups {
            if from == to || !alg.intersects(&image, target) {
                continue;
            }
            if *to != (from + 1) % rows {
                return Err(InvariantViolation::NonConsecutiveAssumptionEdge {
                    rank,
                    from: *from,
                    to: *to,
                });
            }
            edges.insert((*from, *to));
        }
    }

    let nodes = groups
        .into_iter()
        .map(|(row, states)| {
            let node = AssumptionNode {
                row,
                assumption: ctx.game.env_justices[row].clone(),
                states,
            };
            (row, node)
        })
        .collect();
    Ok(AssumptionGraph { nodes, edges })
}
