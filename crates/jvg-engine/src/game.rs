//! The memoized output of a solved counter-strategy game.

use jvg_symbolic::{RegistryBuilder, SymbolicAlgebra, SymbolicError, VarId, VarRole};
use serde::{Deserialize, Serialize};

use crate::error::MemoError;

/// Name of the auxiliary variable that tags states with the progress row
/// (environment assumption) they are currently working towards.
pub const ROW_MARKER: &str = "__jvg_row";

/// Identity of one justice (assumption or guarantee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JusticeInfo {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

impl JusticeInfo {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Declare the row-marker variable for a game with `rows` environment
/// justices.
pub fn declare_row_marker(builder: &mut RegistryBuilder, rows: usize) -> Result<VarId, SymbolicError> {
    builder.declare_range(ROW_MARKER, VarRole::Aux, rows.max(1) as u32)
}

/// Fixpoint memo of an environment-winning game.
///
/// `z[i]` is the cumulative rank layer of rank `i` (monotone in `i`).
/// `x[i][row][col]` is the cumulative progress layer of rank `i` for the
/// environment justice `row`; columns grow with the distance to the
/// justice. Every set is over current variables unless it is a relation.
#[derive(Debug)]
pub struct GameMemo<S> {
    pub ini: S,
    pub env_trans: S,
    pub sys_trans: S,
    pub z: Vec<S>,
    pub x: Vec<Vec<Vec<S>>>,
    pub env_justices: Vec<JusticeInfo>,
    pub sys_justices: Vec<JusticeInfo>,
    pub row_marker: VarId,
}

impl<S> GameMemo<S> {
    pub fn num_rows(&self) -> usize {
        self.env_justices.len()
    }

    pub fn num_ranks(&self) -> usize {
        self.z.len()
    }

    /// Index of the system justice that rank `rank` keeps violated.
    pub fn violated_justice(&self, rank: usize) -> Option<usize> {
        match self.sys_justices.len() {
            0 => None,
            n => Some(rank % n),
        }
    }

    /// Check the structural shape of the memo against `alg`.
    pub fn validate<A>(&self, alg: &A) -> Result<(), MemoError>
    where
        A: SymbolicAlgebra<Set = S>,
    {
        let registry = alg.registry();
        let rows = self.num_rows();
        if rows == 0 {
            return Err(MemoError::Shape("at least one environment justice is required".into()));
        }
        if self.row_marker.index() >= registry.len() || self.row_marker.is_primed() {
            return Err(MemoError::Shape(format!(
                "row marker {} is not a current variable of the registry",
                self.row_marker
            )));
        }
        let marker = registry.var(self.row_marker);
        if marker.role != VarRole::Aux || marker.domain_size() as usize != rows {
            return Err(MemoError::Shape(format!(
                "row marker '{}' must be an aux variable with {} values",
                marker.name, rows
            )));
        }
        for set in [&self.ini, &self.env_trans, &self.sys_trans] {
            if alg.support(set).contains(&self.row_marker) {
                return Err(MemoError::Shape(format!(
                    "game relations must not mention '{}'",
                    marker.name
                )));
            }
        }
        if self.x.len() != self.z.len() {
            return Err(MemoError::Shape(format!(
                "{} rank layers but {} progress matrices",
                self.z.len(),
                self.x.len()
            )));
        }
        for (rank, matrix) in self.x.iter().enumerate() {
            if matrix.len() != rows {
                return Err(MemoError::Shape(format!(
                    "rank {rank} has {} progress rows, expected {rows}",
                    matrix.len()
                )));
            }
            if let Some(row) = matrix.iter().position(Vec::is_empty) {
                return Err(MemoError::Shape(format!(
                    "rank {rank} row {row} has no progress columns"
                )));
            }
        }
        for pair in self.z.windows(2) {
            if !alg.is_subset(&pair[0], &pair[1]) {
                return Err(MemoError::Shape("rank layers are not monotone".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn solved_fixture_games_validate() {
        for fixture in [
            fixtures::copy_game(),
            fixtures::deadlock_game(),
            fixtures::alternating_game(),
        ] {
            fixture.game.validate(&fixture.alg).unwrap();
        }
    }

    #[test]
    fn mismatched_progress_matrix_is_rejected() {
        let mut fixture = fixtures::alternating_game();
        fixture.game.x.pop();
        let err = fixture.game.validate(&fixture.alg).unwrap_err();
        assert!(matches!(err, MemoError::Shape(_)));
    }

    #[test]
    fn non_monotone_layers_are_rejected() {
        let mut fixture = fixtures::alternating_game();
        fixture.game.z.swap(0, 1);
        let err = fixture.game.validate(&fixture.alg).unwrap_err();
        assert!(err.to_string().contains("monotone"));
    }

    #[test]
    fn violated_justice_cycles_through_guarantees() {
        let mut fixture = fixtures::alternating_game();
        fixture.game.sys_justices.push(JusticeInfo::new("g2", ""));
        assert_eq!(fixture.game.violated_justice(0), Some(0));
        assert_eq!(fixture.game.violated_justice(3), Some(1));
        fixture.game.sys_justices.clear();
        assert_eq!(fixture.game.violated_justice(3), None);
    }
}
