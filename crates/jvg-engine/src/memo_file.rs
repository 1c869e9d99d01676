//! JSON representation of a game memo.
//!
//! A memo document declares the game variables and gives every set as a
//! [`Formula`]. Loading it builds a registry (with the row marker added),
//! an [`ExplicitAlgebra`] over that registry and the compiled
//! [`GameMemo`].

use std::path::Path;

use jvg_symbolic::{
    ExplicitAlgebra, ExplicitSet, Formula, RegistryBuilder, SymbolicAlgebra, VarRole,
    VariableRegistry,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MemoError;
use crate::game::{declare_row_marker, GameMemo, JusticeInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub role: VarRole,
    /// Explicit value names. Mutually exclusive with `size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Values `0..size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoDocument {
    pub variables: Vec<VariableDecl>,
    pub initial: Formula,
    pub env_trans: Formula,
    pub sys_trans: Formula,
    #[serde(default)]
    pub env_justices: Vec<JusticeInfo>,
    #[serde(default)]
    pub sys_justices: Vec<JusticeInfo>,
    pub z: Vec<Formula>,
    pub x: Vec<Vec<Vec<Formula>>>,
}

/// A memo compiled into the explicit backend.
pub struct LoadedMemo {
    pub algebra: ExplicitAlgebra,
    pub game: GameMemo<ExplicitSet>,
}

impl MemoDocument {
    /// Environment justices, with a single trivial one when none are listed.
    pub fn effective_env_justices(&self) -> Vec<JusticeInfo> {
        if self.env_justices.is_empty() {
            vec![JusticeInfo::new("true", "true")]
        } else {
            self.env_justices.clone()
        }
    }

    pub fn registry(&self) -> Result<VariableRegistry, MemoError> {
        let mut builder = RegistryBuilder::new();
        for decl in &self.variables {
            match (&decl.values, decl.size) {
                (Some(values), None) => {
                    builder.declare(decl.name.clone(), decl.role, values.iter().cloned())?;
                }
                (None, Some(size)) => {
                    builder.declare_range(decl.name.clone(), decl.role, size)?;
                }
                (None, None) => {
                    builder.declare_bool(decl.name.clone(), decl.role)?;
                }
                (Some(_), Some(_)) => {
                    return Err(MemoError::Shape(format!(
                        "variable '{}' lists both values and size",
                        decl.name
                    )));
                }
            }
        }
        declare_row_marker(&mut builder, self.effective_env_justices().len())?;
        Ok(builder.build())
    }

    /// Compile every formula against `alg`, whose registry must come from
    /// [`MemoDocument::registry`].
    pub fn compile<A: SymbolicAlgebra>(&self, alg: &A) -> Result<GameMemo<A::Set>, MemoError> {
        let row_marker = alg.registry().require(crate::game::ROW_MARKER)?;
        let compile_all = |formulas: &[Formula]| -> Result<Vec<A::Set>, MemoError> {
            formulas
                .iter()
                .map(|f| f.compile(alg).map_err(MemoError::from))
                .collect()
        };
        let mut x = Vec::with_capacity(self.x.len());
        for matrix in &self.x {
            let mut rows = Vec::with_capacity(matrix.len());
            for row in matrix {
                rows.push(compile_all(row)?);
            }
            x.push(rows);
        }
        Ok(GameMemo {
            ini: self.initial.compile(alg)?,
            env_trans: self.env_trans.compile(alg)?,
            sys_trans: self.sys_trans.compile(alg)?,
            z: compile_all(&self.z)?,
            x,
            env_justices: self.effective_env_justices(),
            sys_justices: self.sys_justices.clone(),
            row_marker,
        })
    }

    /// Build the explicit backend and the compiled memo, then validate it.
    pub fn load(&self) -> Result<LoadedMemo, MemoError> {
        let algebra = ExplicitAlgebra::new(self.registry()?)?;
        let game = self.compile(&algebra)?;
        game.validate(&algebra)?;
        debug!(
            variables = self.variables.len(),
            ranks = game.num_ranks(),
            rows = game.num_rows(),
            "Loaded memo"
        );
        Ok(LoadedMemo { algebra, game })
    }
}

pub fn parse_memo(json: &str) -> Result<MemoDocument, MemoError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_memo_str(json: &str) -> Result<LoadedMemo, MemoError> {
    parse_memo(json)?.load()
}

pub fn load_memo_file(path: &Path) -> Result<LoadedMemo, MemoError> {
    let text = std::fs::read_to_string(path).map_err(|source| MemoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_memo_str(&text)
}
