use jvg_symbolic::SymbolicAlgebra;
use tracing::{info, warn};

use crate::context::GameContext;
use crate::decompose::Decomposer;
use crate::error::BuildError;
use crate::game::GameMemo;
use crate::graph::{Jvg, JvgNode, JvgNodeKind, NodeId};
use crate::invariants::annotate_invariants;
use crate::merge::merge_attractors;
use crate::options::BuildOptions;
use crate::ranking::RankingGraph;

/// Build the justice violation graph of a solved, environment-winning game.
///
/// Returns [`BuildError::Realizable`] when no initial state is winning for
/// the environment, and [`BuildError::Invariant`] when the memo (or the
/// construction) turns out inconsistent. No partial graph is returned on
/// failure.
pub fn build_jvg<A: SymbolicAlgebra>(
    alg: &A,
    game: &GameMemo<A::Set>,
    options: &BuildOptions,
) -> Result<Jvg<A::Set>, BuildError> {
    game.validate(alg)?;
    let ctx = GameContext::new(alg, game);

    let mut jvg = match initial_safety_violation(&ctx) {
        Some(jvg) => {
            warn!("Environment can force a system deadlock from the initial states");
            jvg
        }
        None => {
            let ranking = RankingGraph::build(&ctx)?;
            info!(
                ranks = game.num_ranks(),
                rank_nodes = ranking.rank_nodes().count(),
                "Ranking graph ready"
            );
            Decomposer::new(&ctx, &ranking, *options).run()?
        }
    };

    if options.invariants {
        annotate_invariants(&ctx, &mut jvg);
    }
    if options.merge_attractors {
        let merged = merge_attractors(&ctx, &mut jvg, options.invariants);
        info!(merged, nodes = jvg.node_count(), "Merged attractor chains");
    }
    info!(
        nodes = jvg.node_count(),
        edges = jvg.edge_count(),
        "Justice violation graph built"
    );
    Ok(jvg)
}

/// The two-node graph for initial states from which the environment can
/// leave the system without any legal response.
fn initial_safety_violation<A: SymbolicAlgebra>(ctx: &GameContext<'_, A>) -> Option<Jvg<A::Set>> {
    let alg = ctx.alg;
    let choices = alg.and(&ctx.deadlock_choices(), &ctx.game.ini);
    let states = ctx.domain(&choices);
    if alg.is_empty(&states) {
        return None;
    }
    let mut jvg = Jvg::new();
    jvg.add_node(JvgNode {
        id: NodeId::INITIAL,
        rank: None,
        states: alg.share(&ctx.game.ini),
        transitions: alg.empty(),
        invariants: Vec::new(),
        kind: JvgNodeKind::Initial,
    });
    let id = jvg.next_id();
    jvg.add_node(JvgNode {
        id,
        rank: None,
        states,
        transitions: ctx.determinize(&choices),
        invariants: Vec::new(),
        kind: JvgNodeKind::AttractorFromCycle,
    });
    jvg.add_edge(NodeId::INITIAL, id);
    Some(jvg)
}
