//! Shared symbolic helpers over one game memo.
//!
//! Progress cells are tagged with the row marker so that the same concrete
//! state can sit in several rows without ambiguity. Relations built here
//! range over current variables (marker included), primed environment
//! variables and the primed marker. The primed marker names the row a
//! committed step enters; leaving it unconstrained yields an untagged
//! successor.

use jvg_symbolic::{SymbolicAlgebra, VarId, VarRole};

use crate::game::GameMemo;

pub struct GameContext<'a, A: SymbolicAlgebra> {
    pub alg: &'a A,
    pub game: &'a GameMemo<A::Set>,
    marker: VarId,
    current: Vec<VarId>,
    primed: Vec<VarId>,
    env_current: Vec<VarId>,
    env_next: Vec<VarId>,
    sys_next: Vec<VarId>,
    full_trans: A::Set,
}

impl<'a, A: SymbolicAlgebra> GameContext<'a, A> {
    pub fn new(alg: &'a A, game: &'a GameMemo<A::Set>) -> Self {
        let registry = alg.registry();
        let full_trans = alg.and(&game.env_trans, &game.sys_trans);
        Self {
            alg,
            game,
            marker: game.row_marker,
            current: registry.current_vars(),
            primed: registry.primed_vars(),
            env_current: registry.role_vars(VarRole::Env, false),
            env_next: registry.role_vars(VarRole::Env, true),
            sys_next: registry.role_vars(VarRole::Sys, true),
            full_trans,
        }
    }

    pub fn marker(&self) -> VarId {
        self.marker
    }

    pub fn num_rows(&self) -> usize {
        self.game.num_rows()
    }

    /// Current variables other than the row marker.
    pub fn state_vars(&self) -> Vec<VarId> {
        self.current
            .iter()
            .copied()
            .filter(|v| *v != self.marker)
            .collect()
    }

    pub fn env_vars(&self) -> &[VarId] {
        &self.env_current
    }

    /// `set` restricted to states tagged with `row`.
    pub fn tag(&self, set: &A::Set, row: usize) -> A::Set {
        self.alg.and(set, &self.alg.literal(self.marker, row as u32))
    }

    /// Forget the row marker of `set`.
    pub fn strip(&self, set: &A::Set) -> A::Set {
        self.alg.exists(set, &[self.marker])
    }

    /// Steps that enter row `row`.
    pub fn entering_row(&self, row: usize) -> A::Set {
        self.alg.literal(self.marker.twin(), row as u32)
    }

    /// Full game transitions (both players), without marker constraints.
    pub fn full_trans(&self) -> &A::Set {
        &self.full_trans
    }

    /// States reachable from `from` in one game step through `trans`.
    pub fn post(&self, from: &A::Set, trans: &A::Set) -> A::Set {
        self.alg.succ(from, trans)
    }

    /// Environment choices (current state, next environment values) after
    /// which every system response lands in `target`.
    ///
    /// When `target` is tagged, the result also constrains the primed
    /// marker. Choices that leave the system without any response count as
    /// forcing.
    pub fn forcing_choices(&self, target: &A::Set) -> A::Set {
        let alg = self.alg;
        let stays = alg.implies(&self.game.sys_trans, &alg.prime(target));
        alg.and(&self.game.env_trans, &alg.forall(&stays, &self.sys_next))
    }

    /// Environment choices for which some system response lands in `target`.
    pub fn landing_choices(&self, target: &A::Set) -> A::Set {
        let alg = self.alg;
        alg.exists(&alg.and(&self.game.sys_trans, &alg.prime(target)), &self.sys_next)
    }

    /// Environment choices that leave the system without a legal response.
    pub fn deadlock_choices(&self) -> A::Set {
        let alg = self.alg;
        let answerable = alg.exists(&self.game.sys_trans, &self.sys_next);
        alg.and_not(&self.game.env_trans, &answerable)
    }

    /// States that have at least one choice in `choices`.
    pub fn domain(&self, choices: &A::Set) -> A::Set {
        self.alg.exists(choices, &self.primed)
    }

    /// Successors of `from` under the committed environment `choices` and
    /// every legal system response.
    pub fn image(&self, from: &A::Set, choices: &A::Set) -> A::Set {
        let alg = self.alg;
        let steps = alg.and(choices, &self.game.sys_trans);
        alg.succ(from, &steps)
    }

    /// Keep a single choice per state: for every primed environment
    /// variable in turn, the smallest value still available.
    pub fn determinize(&self, choices: &A::Set) -> A::Set {
        let alg = self.alg;
        let mut rel = alg.share(choices);
        for var in &self.env_next {
            let mut picked = alg.empty();
            let mut covered = alg.empty();
            for value in 0..alg.registry().domain_size(*var) {
                let part = alg.and_not(&alg.and(&rel, &alg.literal(*var, value)), &covered);
                if alg.is_empty(&part) {
                    continue;
                }
                covered = alg.or(&covered, &self.domain(&part));
                picked = alg.or(&picked, &part);
            }
            rel = picked;
        }
        rel
    }

    /// All states reachable from `from` under the full game transitions,
    /// staying inside `within`.
    pub fn reach_within(&self, from: &A::Set, within: &A::Set) -> A::Set {
        let alg = self.alg;
        let mut reached = alg.and(from, within);
        loop {
            let step = alg.and(&self.post(&reached, &self.full_trans), within);
            let next = alg.or(&reached, &step);
            if alg.equals(&next, &reached) {
                return reached;
            }
            reached = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn determinize_keeps_one_choice_per_state() {
        let fx = fixtures::alternating_game();
        let ctx = GameContext::new(&fx.alg, &fx.game);
        let alg = &fx.alg;
        let choices = alg.share(&fx.game.env_trans);
        let det = ctx.determinize(&choices);
        let vars = alg.registry().current_vars();
        assert!(alg.is_subset(&det, &choices));
        assert!(alg.equals(&ctx.domain(&det), &ctx.domain(&choices)));
        let e1 = alg.registry().lookup("e'").unwrap();
        let mut with_e1 = vars.clone();
        with_e1.push(e1);
        assert_eq!(alg.count(&det, &with_e1), alg.count(&det, &vars));
    }

    #[test]
    fn forcing_into_lower_rank_uses_env_choice() {
        let fx = fixtures::alternating_game();
        let ctx = GameContext::new(&fx.alg, &fx.game);
        let alg = &fx.alg;
        // sys always answers s'=0, so every choice forces into s=0
        let forced = ctx.forcing_choices(&fx.game.z[0]);
        assert!(alg.equals(&forced, &fx.game.env_trans));
    }

    #[test]
    fn deadlock_choices_of_blocking_game() {
        let fx = fixtures::deadlock_game();
        let ctx = GameContext::new(&fx.alg, &fx.game);
        let alg = &fx.alg;
        let e1 = alg.registry().lookup("e'").unwrap();
        assert!(alg.equals(&ctx.deadlock_choices(), &alg.literal(e1, 1)));
    }

    #[test]
    fn tag_and_strip_are_inverse_on_untagged_sets() {
        let fx = fixtures::alternating_game();
        let ctx = GameContext::new(&fx.alg, &fx.game);
        let alg = &fx.alg;
        let tagged = ctx.tag(&fx.game.z[0], 1);
        assert!(!alg.equals(&tagged, &fx.game.z[0]));
        assert!(alg.equals(&ctx.strip(&tagged), &fx.game.z[0]));
    }
}
