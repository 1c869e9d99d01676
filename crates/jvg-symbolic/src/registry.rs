use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SymbolicError;

/// Suffix marking the next-state twin of a variable.
pub const PRIME_SUFFIX: char = '\'';

/// Index of a variable in a [`VariableRegistry`].
///
/// Every declared variable occupies two consecutive ids: the current-state
/// copy at an even index and its primed twin right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_primed(self) -> bool {
        self.0 % 2 == 1
    }

    /// The other copy (current <-> next) of the same declared variable.
    pub fn twin(self) -> VarId {
        VarId(self.0 ^ 1)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which player owns a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarRole {
    /// Chosen by the environment.
    Env,
    /// Chosen by the system.
    Sys,
    /// Bookkeeping variable owned by neither player (e.g. a row marker).
    Aux,
}

/// A finite-domain variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub role: VarRole,
    pub primed: bool,
    /// Value names, indexed by value.
    pub values: Vec<String>,
}

impl Variable {
    pub fn domain_size(&self) -> u32 {
        self.values.len() as u32
    }
}

/// Read-only table of every variable a game is expressed over.
///
/// The registry is created once and handed to the algebra by value; every
/// call site that needs variable metadata reaches it through
/// [`SymbolicAlgebra::registry`](crate::SymbolicAlgebra::registry).
#[derive(Debug, Clone)]
pub struct VariableRegistry {
    vars: Vec<Variable>,
    by_name: IndexMap<String, VarId>,
}

impl VariableRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Number of variables, primed twins included.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.vars[id.index()].name
    }

    pub fn domain_size(&self, id: VarId) -> u32 {
        self.vars[id.index()].domain_size()
    }

    pub fn value_name(&self, id: VarId, value: u32) -> &str {
        &self.vars[id.index()].values[value as usize]
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<VarId, SymbolicError> {
        self.lookup(name)
            .ok_or_else(|| SymbolicError::UnknownVariable(name.to_string()))
    }

    pub fn value_index(&self, id: VarId, value: &str) -> Option<u32> {
        self.var(id)
            .values
            .iter()
            .position(|v| v == value)
            .map(|pos| pos as u32)
    }

    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.vars.len() as u32).map(VarId)
    }

    pub fn current_vars(&self) -> Vec<VarId> {
        self.ids().filter(|id| !id.is_primed()).collect()
    }

    pub fn primed_vars(&self) -> Vec<VarId> {
        self.ids().filter(|id| id.is_primed()).collect()
    }

    /// Variables of one role, either the current or the primed copies.
    pub fn role_vars(&self, role: VarRole, primed: bool) -> Vec<VarId> {
        self.ids()
            .filter(|id| id.is_primed() == primed && self.var(*id).role == role)
            .collect()
    }
}

/// Incrementally declares variables; each declaration also creates the primed twin.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    vars: Vec<Variable>,
    by_name: IndexMap<String, VarId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable with named values and return the id of its current copy.
    pub fn declare<I, V>(
        &mut self,
        name: impl Into<String>,
        role: VarRole,
        values: I,
    ) -> Result<VarId, SymbolicError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        if name.is_empty() || name.ends_with(PRIME_SUFFIX) {
            return Err(SymbolicError::InvalidName(name));
        }
        let primed_name = format!("{name}{PRIME_SUFFIX}");
        if self.by_name.contains_key(&name) || self.by_name.contains_key(&primed_name) {
            return Err(SymbolicError::DuplicateVariable(name));
        }
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SymbolicError::EmptyDomain(name));
        }
        for (i, value) in values.iter().enumerate() {
            if values[..i].contains(value) {
                return Err(SymbolicError::DuplicateValue(name, value.clone()));
            }
        }

        let current = VarId(self.vars.len() as u32);
        self.vars.push(Variable {
            name: name.clone(),
            role,
            primed: false,
            values: values.clone(),
        });
        self.vars.push(Variable {
            name: primed_name.clone(),
            role,
            primed: true,
            values,
        });
        self.by_name.insert(name, current);
        self.by_name.insert(primed_name, current.twin());
        Ok(current)
    }

    /// Declare a variable whose values are `0..size`.
    pub fn declare_range(
        &mut self,
        name: impl Into<String>,
        role: VarRole,
        size: u32,
    ) -> Result<VarId, SymbolicError> {
        self.declare(name, role, (0..size).map(|v| v.to_string()))
    }

    /// Declare a boolean variable with values `false`/`true`.
    pub fn declare_bool(
        &mut self,
        name: impl Into<String>,
        role: VarRole,
    ) -> Result<VarId, SymbolicError> {
        self.declare(name, role, ["false", "true"])
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn build(self) -> VariableRegistry {
        VariableRegistry {
            vars: self.vars,
            by_name: self.by_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_creates_primed_twin() {
        let mut builder = RegistryBuilder::new();
        let e = builder.declare("e", VarRole::Env, ["a", "b", "c"]).unwrap();
        let s = builder.declare_bool("s", VarRole::Sys).unwrap();
        let registry = builder.build();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.lookup("e"), Some(e));
        assert_eq!(registry.lookup("e'"), Some(e.twin()));
        assert!(e.twin().is_primed());
        assert_eq!(e.twin().twin(), e);
        assert_eq!(registry.domain_size(e.twin()), 3);
        assert_eq!(registry.value_index(s, "true"), Some(1));
        assert_eq!(registry.value_name(e, 2), "c");
        assert_eq!(registry.current_vars(), vec![e, s]);
        assert_eq!(registry.role_vars(VarRole::Sys, true), vec![s.twin()]);
    }

    #[test]
    fn invalid_declarations_are_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.declare_bool("x", VarRole::Env).unwrap();
        assert_eq!(
            builder.declare_bool("x", VarRole::Sys),
            Err(SymbolicError::DuplicateVariable("x".into()))
        );
        assert_eq!(
            builder.declare_bool("y'", VarRole::Sys),
            Err(SymbolicError::InvalidName("y'".into()))
        );
        assert_eq!(
            builder.declare("z", VarRole::Sys, Vec::<String>::new()),
            Err(SymbolicError::EmptyDomain("z".into()))
        );
        assert_eq!(
            builder.declare("w", VarRole::Sys, ["a", "a"]),
            Err(SymbolicError::DuplicateValue("w".into(), "a".into()))
        );
    }

    #[test]
    fn require_reports_unknown_names() {
        let registry = RegistryBuilder::new().build();
        assert!(registry.is_empty());
        assert_eq!(
            registry.require("nope"),
            Err(SymbolicError::UnknownVariable("nope".into()))
        );
    }
}
