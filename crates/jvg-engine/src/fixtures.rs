//! Small solved games shared by the unit tests.
//!
//! `solve` is a straightforward reference solver for the environment side
//! of a GR(1) game: it computes rank layers and cumulative progress layers
//! in the shape the engine consumes.

use jvg_symbolic::{
    ExplicitAlgebra, ExplicitSet, Formula, RegistryBuilder, SymbolicAlgebra, VarRole,
};

use crate::game::{declare_row_marker, GameMemo, JusticeInfo};

pub(crate) struct Fixture {
    pub alg: ExplicitAlgebra,
    pub game: GameMemo<ExplicitSet>,
}

pub(crate) struct GameSpec {
    /// `(name, role, domain size)`
    pub vars: Vec<(&'static str, VarRole, u32)>,
    pub ini: Formula,
    pub env_trans: Formula,
    pub sys_trans: Formula,
    pub env_justices: Vec<Formula>,
    pub sys_justices: Vec<Formula>,
}

impl GameSpec {
    pub fn solve(self) -> Fixture {
        let mut builder = RegistryBuilder::new();
        for (name, role, size) in &self.vars {
            builder.declare_range(*name, *role, *size).unwrap();
        }
        let marker = declare_row_marker(&mut builder, self.env_justices.len()).unwrap();
        let alg = ExplicitAlgebra::new(builder.build()).unwrap();
        let compile = |f: &Formula| f.compile(&alg).unwrap();
        let env_j: Vec<ExplicitSet> = self.env_justices.iter().map(compile).collect();
        let sys_j: Vec<ExplicitSet> = self.sys_justices.iter().map(compile).collect();
        let env_trans = compile(&self.env_trans);
        let sys_trans = compile(&self.sys_trans);
        let (z, x) = solve_layers(&alg, &env_trans, &sys_trans, &env_j, &sys_j);
        let game = GameMemo {
            ini: compile(&self.ini),
            env_trans,
            sys_trans,
            z,
            x,
            env_justices: (0..env_j.len())
                .map(|i| JusticeInfo::new(format!("a{i}"), format!("{:?}", self.env_justices[i])))
                .collect(),
            sys_justices: (0..sys_j.len())
                .map(|i| JusticeInfo::new(format!("g{i}"), format!("{:?}", self.sys_justices[i])))
                .collect(),
            row_marker: marker,
        };
        Fixture { alg, game }
    }
}

type Layers = (Vec<ExplicitSet>, Vec<Vec<Vec<ExplicitSet>>>);

pub(crate) fn solve_layers(
    alg: &ExplicitAlgebra,
    env_trans: &ExplicitSet,
    sys_trans: &ExplicitSet,
    env_j: &[ExplicitSet],
    sys_j: &[ExplicitSet],
) -> Layers {
    let sys_next: Vec<_> = alg.registry().role_vars(VarRole::Sys, true);
    let env_next: Vec<_> = alg.registry().role_vars(VarRole::Env, true);
    let epre = |target: &ExplicitSet| {
        let stays = alg.forall(&alg.implies(sys_trans, &alg.prime(target)), &sys_next);
        alg.exists(&alg.and(env_trans, &stays), &env_next)
    };

    let mut z: Vec<ExplicitSet> = Vec::new();
    let mut x: Vec<Vec<Vec<ExplicitSet>>> = Vec::new();
    let mut z_prev = alg.empty();
    let mut stale = 0;
    let mut rank = 0;
    loop {
        let not_js = alg.not(&sys_j[rank % sys_j.len()]);
        let mut y = alg.universe();
        let rows = loop {
            let mut rows = Vec::new();
            let mut y_next = alg.universe();
            for je in env_j {
                let mut layers: Vec<ExplicitSet> = Vec::new();
                let mut cur = alg.empty();
                loop {
                    let reach_j = alg.and(&alg.and(&not_js, je), &epre(&y));
                    let step = alg.and(&not_js, &epre(&cur));
                    let next = alg.or(&alg.or(&epre(&z_prev), &reach_j), &step);
                    if alg.equals(&next, &cur) {
                        break;
                    }
                    layers.push(alg.share(&next));
                    cur = next;
                }
                y_next = alg.and(&y_next, &cur);
                if layers.is_empty() {
                    layers.push(alg.empty());
                }
                rows.push(layers);
            }
            if alg.equals(&y_next, &y) {
                break rows;
            }
            y = y_next;
        };
        let z_next = alg.or(&z_prev, &y);
        if alg.equals(&z_next, &z_prev) {
            stale += 1;
        } else {
            stale = 0;
        }
        z.push(alg.share(&z_next));
        x.push(rows);
        if stale >= sys_j.len() {
            break;
        }
        z_prev = z_next;
        rank += 1;
    }
    z.truncate(z.len() - stale);
    x.truncate(x.len() - stale);
    (z, x)
}

fn bits(name: &'static str) -> (&'static str, VarRole, u32) {
    (name, VarRole::Env, 2)
}

/// System copies the environment bit; the guarantee `s=1` is violated by
/// an environment that keeps `e=0`.
pub(crate) fn copy_game() -> Fixture {
    GameSpec {
        vars: vec![bits("e"), ("s", VarRole::Sys, 2)],
        ini: Formula::And(vec![Formula::eq("e", "0"), Formula::eq("s", "0")]),
        env_trans: Formula::True,
        sys_trans: Formula::same("s'", "e'"),
        env_justices: vec![Formula::True],
        sys_justices: vec![Formula::eq("s", "1")],
    }
    .solve()
}

/// The system has no response once the environment picks `e'=1`.
pub(crate) fn deadlock_game() -> Fixture {
    GameSpec {
        vars: vec![bits("e"), ("s", VarRole::Sys, 2)],
        ini: Formula::And(vec![Formula::eq("e", "0"), Formula::eq("s", "0")]),
        env_trans: Formula::True,
        sys_trans: Formula::eq("e'", "0"),
        env_justices: vec![Formula::True],
        sys_justices: vec![Formula::eq("s", "1")],
    }
    .solve()
}

/// Two environment justices (`e=0`, `e=1`) that the environment satisfies
/// alternately while the system is stuck at `s=0`. From the initial state
/// `(e=2, s=1)` the environment must move to `e'=2` first.
pub(crate) fn alternating_game() -> Fixture {
    GameSpec {
        vars: vec![("e", VarRole::Env, 3), ("s", VarRole::Sys, 2)],
        ini: Formula::And(vec![Formula::eq("e", "2"), Formula::eq("s", "1")]),
        env_trans: Formula::implies(Formula::eq("s", "1"), Formula::eq("e'", "2")),
        sys_trans: Formula::eq("s'", "0"),
        env_justices: vec![Formula::eq("e", "0"), Formula::eq("e", "1")],
        sys_justices: vec![Formula::eq("s", "1")],
    }
    .solve()
}

/// Like `alternating_game`, but the environment must flip between `e=0`
/// and `e=1`, so a cycle visits each of them under a single row.
pub(crate) fn forced_alternation_game() -> Fixture {
    GameSpec {
        vars: vec![("e", VarRole::Env, 3), ("s", VarRole::Sys, 2)],
        ini: Formula::And(vec![Formula::eq("e", "2"), Formula::eq("s", "1")]),
        env_trans: Formula::And(vec![
            Formula::implies(Formula::eq("e", "0"), Formula::eq("e'", "1")),
            Formula::implies(Formula::eq("e", "1"), Formula::eq("e'", "0")),
        ]),
        sys_trans: Formula::eq("s'", "0"),
        env_justices: vec![Formula::eq("e", "0"), Formula::eq("e", "1")],
        sys_justices: vec![Formula::eq("s", "1")],
    }
    .solve()
}

/// Cube over the named current variables.
pub(crate) fn state(alg: &ExplicitAlgebra, values: &[(&str, u32)]) -> ExplicitSet {
    let assignment: Vec<_> = values
        .iter()
        .map(|(name, value)| (alg.registry().lookup(name).unwrap(), *value))
        .collect();
    alg.cube(&assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_game_layers_match_hand_computation() {
        let fx = alternating_game();
        let alg = &fx.alg;
        let s0 = state(alg, &[("s", 0)]);
        assert_eq!(fx.game.z.len(), 2);
        assert!(alg.equals(&fx.game.z[0], &s0));
        assert!(alg.equals(&fx.game.z[1], &alg.universe()));

        let row0 = &fx.game.x[0][0];
        assert_eq!(row0.len(), 2);
        assert!(alg.equals(&row0[0], &state(alg, &[("e", 0), ("s", 0)])));
        assert!(alg.equals(&row0[1], &s0));
        let row1 = &fx.game.x[0][1];
        assert!(alg.equals(&row1[0], &state(alg, &[("e", 1), ("s", 0)])));
        assert_eq!(fx.game.x[1][0].len(), 1);
    }

    #[test]
    fn copy_game_has_two_ranks() {
        let fx = copy_game();
        let alg = &fx.alg;
        assert_eq!(fx.game.z.len(), 2);
        assert!(alg.equals(&fx.game.z[0], &state(alg, &[("s", 0)])));
        assert_eq!(fx.game.x[0].len(), 1);
        assert_eq!(fx.game.x[0][0].len(), 1);
    }
}
