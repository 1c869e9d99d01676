//! `variable = value` invariants of node and edge state sets.

use std::collections::BTreeMap;

use jvg_symbolic::{SymbolicAlgebra, VarId};

use crate::context::GameContext;
use crate::graph::{Invariant, Jvg, NodeId};

/// Every `(var, value)` with `set ∧ var=value = set`, over the current
/// variables in the support of `set` other than those in `skip`.
///
/// The empty set yields no invariants.
pub fn extract_invariants<A: SymbolicAlgebra>(
    alg: &A,
    set: &A::Set,
    skip: &[VarId],
) -> Vec<Invariant> {
    if alg.is_empty(set) {
        return Vec::new();
    }
    let registry = alg.registry();
    let mut out = Vec::new();
    for var in alg.support(set) {
        if var.is_primed() || skip.contains(&var) {
            continue;
        }
        for value in 0..registry.domain_size(var) {
            if alg.equals(&alg.and(set, &alg.literal(var, value)), set) {
                out.push(Invariant {
                    var: registry.name(var).to_string(),
                    value: registry.value_name(var, value).to_string(),
                });
                break;
            }
        }
    }
    out
}

/// The states an edge carries: the initial states for edges leaving the
/// initial node, otherwise the one-step image of the source node.
pub fn edge_states<A: SymbolicAlgebra>(
    ctx: &GameContext<'_, A>,
    jvg: &Jvg<A::Set>,
    from: NodeId,
    to: NodeId,
) -> Option<A::Set> {
    let alg = ctx.alg;
    let target = ctx.strip(&jvg.node(to)?.states);
    let source = if from == NodeId::INITIAL {
        alg.share(&ctx.game.ini)
    } else {
        let node = jvg.node(from)?;
        ctx.strip(&ctx.image(&node.states, &node.transitions))
    };
    Some(alg.and(&source, &target))
}

/// Recompute the invariants of every node and edge.
pub fn annotate_invariants<A: SymbolicAlgebra>(ctx: &GameContext<'_, A>, jvg: &mut Jvg<A::Set>) {
    let alg = ctx.alg;
    let skip = [ctx.marker()];
    for node in jvg.nodes_mut() {
        let states = ctx.strip(&node.states);
        node.invariants = extract_invariants(alg, &states, &skip);
    }
    annotate_edges(ctx, jvg, |_, _| true);
}

/// Recompute the invariants of the edges `touched` selects.
pub fn annotate_edges<A, F>(ctx: &GameContext<'_, A>, jvg: &mut Jvg<A::Set>, touched: F)
where
    A: SymbolicAlgebra,
    F: Fn(NodeId, NodeId) -> bool,
{
    let alg = ctx.alg;
    let skip = [ctx.marker()];
    let mut per_edge: BTreeMap<(NodeId, NodeId), Vec<Invariant>> = jvg
        .edges()
        .filter(|edge| touched(edge.from, edge.to))
        .map(|edge| {
            let invariants = edge_states(ctx, jvg, edge.from, edge.to)
                .map(|set| extract_invariants(alg, &set, &skip))
                .unwrap_or_default();
            ((edge.from, edge.to), invariants)
        })
        .collect();
    for edge in jvg.edges_mut() {
        if let Some(invariants) = per_edge.remove(&(edge.from, edge.to)) {
            edge.invariants = invariants;
        }
    }
}
