#![doc = include_str!("../README.md")]

//! Symbolic sets over finite-domain game variables.
//!
//! This crate defines the variable registry shared by every algebra call
//! site, the [`SymbolicAlgebra`](algebra::SymbolicAlgebra) trait the engine
//! is written against, an explicit bitmap backend, and a small formula
//! language used by memo files.

pub mod algebra;
pub mod error;
pub mod explicit;
pub mod formula;
pub mod registry;

pub use algebra::SymbolicAlgebra;
pub use error::SymbolicError;
pub use explicit::{ExplicitAlgebra, ExplicitSet};
pub use formula::Formula;
pub use registry::{RegistryBuilder, VarId, VarRole, Variable, VariableRegistry};
