//! Work-list decomposition of rank nodes into graph nodes.
//!
//! Rank nodes are processed from the highest rank down. Processing one
//! item splits its states into:
//!
//! - attractor candidates: states from which the environment forces the
//!   play into a lower rank (or into a system deadlock),
//! - cycle states: points of traced paths that close a cycle, plus what
//!   the committed choices keep reaching among the traced states,
//! - attractor-to states: path prefixes leading into a cycle.
//!
//! Every emitted node's successors in other rank nodes become start points
//! of their items, which are queued (or merged into the queued item).

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use jvg_symbolic::SymbolicAlgebra;
use tracing::{debug, info};

use crate::assumptions::build_assumption_graph;
use crate::context::GameContext;
use crate::error::{BuildError, InvariantViolation};
use crate::game::GameMemo;
use crate::graph::{Jvg, JvgNode, JvgNodeKind, NodeId};
use crate::invariants::edge_states;
use crate::options::BuildOptions;
use crate::path::{PathPoint, PathTracer, TracedPath};
use crate::ranking::{RankingGraph, RgNode, RgNodeId};

/// States of a progress cell that already-built nodes lead into.
#[derive(Debug)]
pub struct StartPoint<S> {
    pub states: S,
    pub from: BTreeSet<NodeId>,
}

/// Transient state of one rank node awaiting or undergoing decomposition.
#[derive(Debug)]
pub struct RgNodeProcessInfo<S> {
    pub rg_node: RgNodeId,
    pub rank: usize,
    /// `cells[row][col]`: states of the rank node first reached at column
    /// `col` of the progress matrix row `row`.
    pub cells: Vec<Vec<S>>,
    pub start_points: BTreeMap<(usize, usize), StartPoint<S>>,
    /// Environment choices committed while decomposing this node.
    pub inner: S,
}

impl<S> RgNodeProcessInfo<S> {
    pub fn new<A>(alg: &A, game: &GameMemo<S>, node: &RgNode<S>) -> Self
    where
        A: SymbolicAlgebra<Set = S>,
    {
        let cells = game
            .x
            .get(node.rank)
            .map(|matrix| {
                matrix
                    .iter()
                    .map(|layers| {
                        let mut seen = alg.empty();
                        layers
                            .iter()
                            .map(|layer| {
                                let cell = alg.and(&alg.and_not(layer, &seen), &node.states);
                                seen = alg.or(&seen, layer);
                                cell
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self {
            rg_node: node.id,
            rank: node.rank,
            cells,
            start_points: BTreeMap::new(),
            inner: alg.empty(),
        }
    }

    pub fn add_start_point<A>(&mut self, alg: &A, cell: (usize, usize), states: S, from: NodeId)
    where
        A: SymbolicAlgebra<Set = S>,
    {
        match self.start_points.entry(cell) {
            Entry::Occupied(mut entry) => {
                let point = entry.get_mut();
                point.states = alg.or(&point.states, &states);
                point.from.insert(from);
            }
            Entry::Vacant(entry) => {
                entry.insert(StartPoint {
                    states,
                    from: BTreeSet::from([from]),
                });
            }
        }
    }

    /// Record `states` as a start point of every cell it intersects.
    pub fn offer<A>(&mut self, alg: &A, states: &S, from: NodeId) -> usize
    where
        A: SymbolicAlgebra<Set = S>,
    {
        let mut added = 0;
        for row in 0..self.cells.len() {
            for col in 0..self.cells[row].len() {
                let part = alg.and(states, &self.cells[row][col]);
                if !alg.is_empty(&part) {
                    self.add_start_point(alg, (row, col), part, from);
                    added += 1;
                }
            }
        }
        added
    }
}

pub(crate) struct Decomposer<'r, 'a, A: SymbolicAlgebra> {
    ctx: &'r GameContext<'a, A>,
    ranking: &'r RankingGraph<A::Set>,
    options: BuildOptions,
    worklist: BTreeMap<usize, RgNodeProcessInfo<A::Set>>,
    done: BTreeSet<RgNodeId>,
    jvg: Jvg<A::Set>,
}

impl<'r, 'a, A: SymbolicAlgebra> Decomposer<'r, 'a, A> {
    pub fn new(
        ctx: &'r GameContext<'a, A>,
        ranking: &'r RankingGraph<A::Set>,
        options: BuildOptions,
    ) -> Self {
        let alg = ctx.alg;
        let mut jvg = Jvg::new();
        jvg.add_node(JvgNode {
            id: NodeId::INITIAL,
            rank: None,
            states: alg.share(&ctx.game.ini),
            transitions: alg.empty(),
            invariants: Vec::new(),
            kind: JvgNodeKind::Initial,
        });
        Self {
            ctx,
            ranking,
            options,
            worklist: BTreeMap::new(),
            done: BTreeSet::new(),
            jvg,
        }
    }

    pub fn run(mut self) -> Result<Jvg<A::Set>, BuildError> {
        self.seed();
        while let Some((rank, item)) = self.worklist.pop_last() {
            debug!(rank, start_points = item.start_points.len(), "Processing rank node");
            self.process(item)?;
        }
        Ok(self.jvg)
    }

    fn item(&mut self, id: RgNodeId) -> Option<&mut RgNodeProcessInfo<A::Set>> {
        let ranking = self.ranking;
        let alg = self.ctx.alg;
        let game = self.ctx.game;
        let node = ranking.node(id)?;
        Some(
            self.worklist
                .entry(node.rank)
                .or_insert_with(|| RgNodeProcessInfo::new(alg, game, node)),
        )
    }

    /// Queue the marker's targets with one start point per cell holding
    /// initial states, each fixed to a single environment valuation.
    fn seed(&mut self) {
        let ctx = self.ctx;
        let alg = ctx.alg;
        let ranking = self.ranking;
        for target in ranking.marker_targets() {
            let Some(item) = self.item(*target) else {
                continue;
            };
            for row in 0..item.cells.len() {
                for col in 0..item.cells[row].len() {
                    let mut part = alg.and(&ctx.game.ini, &item.cells[row][col]);
                    if alg.is_empty(&part) {
                        continue;
                    }
                    if let Some(cube) = alg.sat_one(&part, ctx.env_vars()) {
                        part = alg.and(&part, &cube);
                    }
                    item.add_start_point(alg, (row, col), part, NodeId::INITIAL);
                }
            }
        }
    }

    fn lower_layers(&self, item: &RgNodeProcessInfo<A::Set>) -> Result<A::Set, InvariantViolation> {
        let alg = self.ctx.alg;
        let mut lower = alg.empty();
        for target in self.ranking.edges_from(item.rg_node) {
            let Some(node) = self.ranking.node(*target) else {
                return Err(InvariantViolation::MissingRankNode { id: target.0 });
            };
            if node.rank >= item.rank {
                return Err(InvariantViolation::RankNotDecreasing {
                    from: item.rank,
                    to: node.rank,
                });
            }
            lower = alg.or(&lower, &node.states);
        }
        Ok(lower)
    }

    /// Grow the set of states that can force the play into `lower` (or
    /// into states already collected), committing one choice per state.
    fn attractor_candidates(
        &self,
        item: &mut RgNodeProcessInfo<A::Set>,
        states: &A::Set,
        lower: &A::Set,
    ) -> A::Set {
        let ctx = self.ctx;
        let alg = ctx.alg;
        let mut candidates = alg.empty();
        loop {
            let target = alg.or(lower, &candidates);
            let choices = alg.and_not(&alg.and(&ctx.forcing_choices(&target), states), &candidates);
            let fresh = ctx.domain(&choices);
            if alg.is_empty(&fresh) {
                return candidates;
            }
            item.inner = alg.or(&item.inner, &ctx.determinize(&choices));
            candidates = alg.or(&candidates, &fresh);
        }
    }

    /// Close `from` under the committed choices of `item`, staying in `within`.
    fn close(&self, item: &RgNodeProcessInfo<A::Set>, from: &A::Set, within: &A::Set) -> A::Set {
        let alg = self.ctx.alg;
        let mut reached = alg.share(from);
        loop {
            let step = alg.and(&self.ctx.image(&reached, &item.inner), within);
            let next = alg.or(&reached, &step);
            if alg.equals(&next, &reached) {
                return reached;
            }
            reached = next;
        }
    }

    fn process(&mut self, mut item: RgNodeProcessInfo<A::Set>) -> Result<(), BuildError> {
        let ctx = self.ctx;
        let alg = ctx.alg;
        let ranking = self.ranking;
        let rank = item.rank;
        self.done.insert(item.rg_node);
        let Some(node) = ranking.node(item.rg_node) else {
            return Err(InvariantViolation::MissingRankNode { id: item.rg_node.0 }.into());
        };

        let lower = self.lower_layers(&item)?;
        let candidates = self.attractor_candidates(&mut item, &node.states, &lower);
        let filtered: Vec<Vec<A::Set>> = item
            .cells
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .map(|cell| ctx.tag(&alg.and_not(cell, &candidates), row))
                    .collect::<Vec<_>>()
            })
            .collect();
        let escape = alg.or(&candidates, &lower);

        let seeds: Vec<PathPoint<A::Set>> = item
            .start_points
            .iter()
            .filter_map(|(&(row, col), point)| {
                let states = alg.and(&filtered[row][col], &ctx.tag(&point.states, row));
                (!alg.is_empty(&states)).then_some(PathPoint { row, col, states })
            })
            .collect();
        let paths = PathTracer::new(ctx, rank, &filtered, &escape, &mut item.inner).trace_all(seeds)?;

        let union_points = |select: fn(&TracedPath<A::Set>) -> &[PathPoint<A::Set>]| {
            alg.or_all(paths.iter().flat_map(|p| select(p).iter().map(|pt| &pt.states)))
        };
        let on_path = union_points(|p| &p.points);
        let on_cycle = union_points(TracedPath::cycle);
        let on_prefix = union_points(TracedPath::prefix);

        let cycle = self.close(&item, &on_cycle, &on_path);
        // prefix states are dropped under every tag once any copy is on the cycle
        let attractor_to = alg.and_not(&on_prefix, &ctx.strip(&cycle));
        let started = alg.or_all(item.start_points.values().map(|p| &p.states));
        let from_paths = ctx.strip(&ctx.image(&on_path, &item.inner));
        let entry = alg.and(&alg.or(&started, &from_paths), &candidates);
        let attractor_from = self.close(&item, &entry, &candidates);

        let mut emitted = Vec::new();
        if !alg.is_empty(&attractor_to) {
            emitted.push(self.emit(&item, attractor_to, JvgNodeKind::AttractorNotFromCycle));
        }
        if !alg.is_empty(&cycle) {
            let assumptions = if self.options.assumption_graphs {
                Some(build_assumption_graph(ctx, rank, &cycle, &item.inner, &paths)?)
            } else {
                None
            };
            emitted.push(self.emit(&item, cycle, JvgNodeKind::Cycle { assumptions }));
        }
        if !alg.is_empty(&attractor_from) {
            emitted.push(self.emit(&item, attractor_from, JvgNodeKind::AttractorFromCycle));
        }

        let predecessors: BTreeSet<NodeId> = item
            .start_points
            .values()
            .flat_map(|p| p.from.iter().copied())
            .collect();
        for to in &emitted {
            for from in &predecessors {
                self.connect(*from, *to);
            }
        }
        for (i, from) in emitted.iter().enumerate() {
            for to in &emitted[i + 1..] {
                self.connect(*from, *to);
            }
        }

        self.queue_successors(&item, &emitted)?;
        info!(
            rank,
            paths = paths.len(),
            nodes = emitted.len(),
            "Decomposed rank node"
        );
        Ok(())
    }

    fn emit(
        &mut self,
        item: &RgNodeProcessInfo<A::Set>,
        states: A::Set,
        kind: JvgNodeKind<A::Set>,
    ) -> NodeId {
        let id = self.jvg.next_id();
        let transitions = self.ctx.alg.and(&item.inner, &states);
        debug!(node = %id, rank = item.rank, kind = ?kind.tag(), "Emitted node");
        self.jvg.add_node(JvgNode {
            id,
            rank: Some(item.rank),
            states,
            transitions,
            invariants: Vec::new(),
            kind,
        });
        id
    }

    /// Add `from -> to` when a step of `from` (or an initial state) lands in `to`.
    fn connect(&mut self, from: NodeId, to: NodeId) {
        let alg = self.ctx.alg;
        let witnessed = edge_states(self.ctx, &self.jvg, from, to).is_some_and(|s| !alg.is_empty(&s));
        if witnessed {
            self.jvg.add_edge(from, to);
        }
    }

    fn queue_successors(
        &mut self,
        item: &RgNodeProcessInfo<A::Set>,
        emitted: &[NodeId],
    ) -> Result<(), BuildError> {
        let ctx = self.ctx;
        let alg = ctx.alg;
        let ranking = self.ranking;
        let images: Vec<(NodeId, A::Set)> = emitted
            .iter()
            .filter_map(|id| {
                let node = self.jvg.node(*id)?;
                Some((*id, ctx.strip(&ctx.image(&node.states, &node.transitions))))
            })
            .collect();
        for (id, image) in images {
            for other in ranking.rank_nodes() {
                if other.id == item.rg_node || !alg.intersects(&image, &other.states) {
                    continue;
                }
                if self.done.contains(&other.id) {
                    return Err(InvariantViolation::SuccessorIntoDecomposedRank {
                        rank: item.rank,
                        target: other.rank,
                    }
                    .into());
                }
                if let Some(next) = self.item(other.id) {
                    let added = next.offer(alg, &image, id);
                    debug!(from = %id, rank = other.rank, cells = added, "Queued successor");
                }
            }
        }
        Ok(())
    }
}
