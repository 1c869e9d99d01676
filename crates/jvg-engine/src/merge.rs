//! Collapse chains of attractor nodes.
//!
//! An attractor child is folded into an attractor parent when the child is
//! reachable from the parent along exactly one path. Cycle and initial
//! nodes are never merged. Edges touching a grown node get their invariants
//! recomputed, and node ids are renumbered to stay consecutive.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use jvg_symbolic::SymbolicAlgebra;
use tracing::debug;

use crate::context::GameContext;
use crate::graph::{Jvg, NodeId};
use crate::invariants::annotate_edges;

/// Number of distinct paths from `from` to `to`, saturating at 2.
fn path_count<S>(jvg: &Jvg<S>, from: NodeId, to: NodeId) -> u8 {
    let mut reachable = BTreeSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(id) = queue.pop_front() {
        for child in jvg.children(id) {
            if reachable.insert(child) {
                queue.push_back(child);
            }
        }
    }
    if !reachable.contains(&to) {
        return 0;
    }

    let mut in_degree: BTreeMap<NodeId, usize> = reachable.iter().map(|id| (*id, 0)).collect();
    for id in &reachable {
        for child in jvg.children(*id) {
            if let Some(d) = in_degree.get_mut(&child) {
                *d += 1;
            }
        }
    }
    let mut counts: BTreeMap<NodeId, u8> = BTreeMap::from([(from, 1)]);
    let mut ready: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    while let Some(id) = ready.pop_front() {
        let here = counts.get(&id).copied().unwrap_or(0);
        for child in jvg.children(id) {
            let entry = counts.entry(child).or_insert(0);
            *entry = (*entry + here).min(2);
            if let Some(d) = in_degree.get_mut(&child) {
                *d -= 1;
                if *d == 0 {
                    ready.push_back(child);
                }
            }
        }
    }
    if in_degree.get(&to).is_some_and(|d| *d > 0) {
        // `to` sits on a cycle: treat it as reachable in many ways
        return 2;
    }
    counts.get(&to).copied().unwrap_or(0)
}

/// Fold `child` into `parent`: union the state sets and transitions, keep
/// the shared invariants and reroute the child's other edges.
fn absorb<A: SymbolicAlgebra>(alg: &A, jvg: &mut Jvg<A::Set>, parent: NodeId, child: NodeId) {
    let Some((removed, edges)) = jvg.remove_node(child) else {
        return;
    };
    if let Some(node) = jvg.node_mut(parent) {
        node.states = alg.or(&node.states, &removed.states);
        node.transitions = alg.or(&node.transitions, &removed.transitions);
        node.invariants.retain(|inv| removed.invariants.contains(inv));
    }
    for edge in edges {
        let (from, to) = if edge.from == child {
            (parent, edge.to)
        } else {
            (edge.from, parent)
        };
        jvg.merge_edge(from, to, edge.invariants);
    }
}

/// Merge attractor nodes along single-path chains, breadth first from the
/// initial node. Returns the number of nodes folded away.
///
/// With `refresh_invariants`, every edge incident to a node that absorbed
/// another gets its invariants recomputed from the merged state sets.
pub fn merge_attractors<A: SymbolicAlgebra>(
    ctx: &GameContext<'_, A>,
    jvg: &mut Jvg<A::Set>,
    refresh_invariants: bool,
) -> usize {
    let alg = ctx.alg;
    let mut merged = 0;
    let mut grown = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([NodeId::INITIAL]);
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = jvg.node(id) else {
            continue;
        };
        let children = jvg.children(id);
        if !node.kind.is_attractor() {
            queue.extend(children);
            continue;
        }
        for child in children {
            let foldable = jvg.node(child).is_some_and(|c| c.kind.is_attractor())
                && path_count(jvg, id, child) <= 1;
            if !foldable {
                queue.push_back(child);
                continue;
            }
            let grandchildren = jvg.children(child);
            absorb(alg, jvg, id, child);
            grown.insert(id);
            merged += 1;
            debug!(parent = %id, child = %child, "Merged attractor node");
            queue.extend(grandchildren.into_iter().filter(|g| *g != id));
        }
    }
    if refresh_invariants && !grown.is_empty() {
        annotate_edges(ctx, jvg, |from, to| grown.contains(&from) || grown.contains(&to));
    }
    jvg.renumber();
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, state};
    use crate::graph::{Invariant, JvgNode, JvgNodeKind, NodeKindTag};
    use crate::invariants::annotate_invariants;
    use jvg_symbolic::{ExplicitAlgebra, ExplicitSet};

    fn add(alg: &ExplicitAlgebra, g: &mut Jvg<ExplicitSet>, id: usize, kind: JvgNodeKind<ExplicitSet>) {
        let e = alg.registry().lookup("e").unwrap();
        g.add_node(JvgNode {
            id: NodeId(id),
            rank: Some(0),
            states: alg.literal(e, (id % 3) as u32),
            transitions: alg.empty(),
            invariants: vec![Invariant {
                var: "s".into(),
                value: "0".into(),
            }],
            kind,
        });
    }

    #[test]
    fn diamond_keeps_the_shared_target() {
        // 0 -> 1(A) ; 1 -> 2(B), 1 -> 3(C), 3 -> 2
        let fx = fixtures::alternating_game();
        let alg = &fx.alg;
        let mut g = Jvg::new();
        add(alg, &mut g, 0, JvgNodeKind::Initial);
        add(alg, &mut g, 1, JvgNodeKind::AttractorFromCycle);
        add(alg, &mut g, 2, JvgNodeKind::AttractorNotFromCycle);
        add(alg, &mut g, 3, JvgNodeKind::AttractorFromCycle);
        g.add_edge(NodeId(0), NodeId(1));
        g.add_edge(NodeId(1), NodeId(2));
        g.add_edge(NodeId(1), NodeId(3));
        g.add_edge(NodeId(3), NodeId(2));

        let ctx = GameContext::new(alg, &fx.game);
        let merged = merge_attractors(&ctx, &mut g, false);
        assert_eq!(merged, 1);
        assert_eq!(g.node_count(), 3);
        // C folded into A; B survives and is renumbered to 2
        assert!(g.has_edge(NodeId(0), NodeId(1)));
        assert!(g.has_edge(NodeId(1), NodeId(2)));
        assert_eq!(g.edge_count(), 2);
        let a = g.node(NodeId(1)).unwrap();
        let e = alg.registry().lookup("e").unwrap();
        assert!(alg.equals(&a.states, &alg.or(&alg.literal(e, 1), &alg.literal(e, 0))));
    }

    #[test]
    fn cycles_are_never_merged() {
        let fx = fixtures::alternating_game();
        let alg = &fx.alg;
        let mut g = Jvg::new();
        add(alg, &mut g, 0, JvgNodeKind::Initial);
        add(alg, &mut g, 1, JvgNodeKind::AttractorNotFromCycle);
        add(alg, &mut g, 2, JvgNodeKind::Cycle { assumptions: None });
        add(alg, &mut g, 3, JvgNodeKind::AttractorFromCycle);
        g.add_edge(NodeId(0), NodeId(1));
        g.add_edge(NodeId(1), NodeId(2));
        g.add_edge(NodeId(2), NodeId(3));
        let ctx = GameContext::new(alg, &fx.game);
        assert_eq!(merge_attractors(&ctx, &mut g, true), 0);
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.nodes_of_kind(NodeKindTag::Cycle), vec![NodeId(2)]);
    }

    #[test]
    fn path_count_saturates() {
        let mut g: Jvg<()> = Jvg::new();
        for id in 0..4 {
            g.add_node(JvgNode {
                id: NodeId(id),
                rank: None,
                states: (),
                transitions: (),
                invariants: Vec::new(),
                kind: JvgNodeKind::AttractorFromCycle,
            });
        }
        g.add_edge(NodeId(0), NodeId(1));
        g.add_edge(NodeId(0), NodeId(2));
        g.add_edge(NodeId(1), NodeId(3));
        g.add_edge(NodeId(2), NodeId(3));
        assert_eq!(path_count(&g, NodeId(0), NodeId(1)), 1);
        assert_eq!(path_count(&g, NodeId(0), NodeId(3)), 2);
        assert_eq!(path_count(&g, NodeId(1), NodeId(2)), 0);
    }

    fn edge_invariants(g: &Jvg<ExplicitSet>) -> Vec<Vec<String>> {
        g.edges()
            .map(|e| e.invariants.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn merged_edges_carry_fresh_invariants() {
        // 0 -> 1(A) -> 2(B) -> 3(C); B folds into A
        let fx = fixtures::alternating_game();
        let alg = &fx.alg;
        let ctx = GameContext::new(alg, &fx.game);
        let e1 = alg.registry().lookup("e'").unwrap();
        let mut g = Jvg::new();
        let nodes = [
            (alg.share(&fx.game.ini), 2, JvgNodeKind::Initial),
            (state(alg, &[("e", 2), ("s", 1)]), 2, JvgNodeKind::AttractorFromCycle),
            (state(alg, &[("e", 2), ("s", 0)]), 0, JvgNodeKind::AttractorNotFromCycle),
            (state(alg, &[("e", 0), ("s", 0)]), 1, JvgNodeKind::Cycle { assumptions: None }),
        ];
        for (id, (states, choice, kind)) in nodes.into_iter().enumerate() {
            let transitions = alg.and(&states, &alg.literal(e1, choice));
            g.add_node(JvgNode {
                id: NodeId(id),
                rank: Some(0),
                states,
                transitions,
                invariants: Vec::new(),
                kind,
            });
        }
        g.add_edge(NodeId(0), NodeId(1));
        g.add_edge(NodeId(1), NodeId(2));
        g.add_edge(NodeId(2), NodeId(3));
        annotate_invariants(&ctx, &mut g);
        // poison the rerouted edge so only a recomputation can repair it
        for edge in g.edges_mut() {
            if edge.from == NodeId(2) {
                edge.invariants = vec![Invariant {
                    var: "e".into(),
                    value: "1".into(),
                }];
            }
        }

        assert_eq!(merge_attractors(&ctx, &mut g, true), 1);
        assert_eq!(g.node_count(), 3);
        let merged = edge_invariants(&g);
        assert_eq!(
            merged,
            vec![vec!["e = 2", "s = 1"], vec!["e = 0", "s = 0"]]
        );
        annotate_invariants(&ctx, &mut g);
        assert_eq!(edge_invariants(&g), merged);
    }
}
