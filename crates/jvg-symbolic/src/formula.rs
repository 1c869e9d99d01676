//! Boolean formulas over registry variables.
//!
//! Formulas are the serialized form of every set in a memo file. Primed
//! variables are written with a trailing `'` (for example `"e'"`).

use serde::{Deserialize, Serialize};

use crate::algebra::SymbolicAlgebra;
use crate::error::SymbolicError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    True,
    False,
    /// `var = value`, with `value` given by name.
    Eq { var: String, value: String },
    /// `var = other`, comparing values by name.
    Same { var: String, other: String },
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn eq(var: impl Into<String>, value: impl Into<String>) -> Self {
        Formula::Eq {
            var: var.into(),
            value: value.into(),
        }
    }

    pub fn same(var: impl Into<String>, other: impl Into<String>) -> Self {
        Formula::Same {
            var: var.into(),
            other: other.into(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Formula) -> Self {
        Formula::Not(Box::new(inner))
    }

    pub fn implies(lhs: Formula, rhs: Formula) -> Self {
        Formula::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn iff(lhs: Formula, rhs: Formula) -> Self {
        Formula::Iff(Box::new(lhs), Box::new(rhs))
    }

    /// Compile into a set of `alg`.
    pub fn compile<A: SymbolicAlgebra>(&self, alg: &A) -> Result<A::Set, SymbolicError> {
        let registry = alg.registry();
        match self {
            Formula::True => Ok(alg.universe()),
            Formula::False => Ok(alg.empty()),
            Formula::Eq { var, value } => {
                let id = registry.require(var)?;
                let index =
                    registry
                        .value_index(id, value)
                        .ok_or_else(|| SymbolicError::UnknownValue {
                            var: var.clone(),
                            value: value.clone(),
                        })?;
                Ok(alg.literal(id, index))
            }
            Formula::Same { var, other } => {
                let lhs = registry.require(var)?;
                let rhs = registry.require(other)?;
                let mut acc = alg.empty();
                let mut shared = false;
                for (index, name) in registry.var(lhs).values.iter().enumerate() {
                    if let Some(other_index) = registry.value_index(rhs, name) {
                        shared = true;
                        let both =
                            alg.and(&alg.literal(lhs, index as u32), &alg.literal(rhs, other_index));
                        acc = alg.or(&acc, &both);
                    }
                }
                if !shared {
                    return Err(SymbolicError::DisjointDomains {
                        var: var.clone(),
                        other: other.clone(),
                    });
                }
                Ok(acc)
            }
            Formula::Not(inner) => Ok(alg.not(&inner.compile(alg)?)),
            Formula::And(parts) => {
                let mut acc = alg.universe();
                for part in parts {
                    acc = alg.and(&acc, &part.compile(alg)?);
                }
                Ok(acc)
            }
            Formula::Or(parts) => {
                let mut acc = alg.empty();
                for part in parts {
                    acc = alg.or(&acc, &part.compile(alg)?);
                }
                Ok(acc)
            }
            Formula::Implies(lhs, rhs) => Ok(alg.implies(&lhs.compile(alg)?, &rhs.compile(alg)?)),
            Formula::Iff(lhs, rhs) => {
                let l = lhs.compile(alg)?;
                let r = rhs.compile(alg)?;
                Ok(alg.and(&alg.implies(&l, &r), &alg.implies(&r, &l)))
            }
        }
    }
}
