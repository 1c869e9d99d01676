#![doc = include_str!("../README.md")]

//! Justice violation graph engine.
//!
//! This crate turns the rank layers and progress matrices of a solved
//! counter-strategy game into a finite witness graph: ranking graph
//! construction, work-list node decomposition with path tracing,
//! assumption-satisfaction subgraphs, invariant extraction, attractor
//! merging and JSON reporting.

pub mod assumptions;
pub mod builder;
pub mod context;
pub mod decompose;
pub mod error;
pub mod game;
pub mod graph;
pub mod invariants;
pub mod memo_file;
pub mod merge;
pub mod options;
pub mod path;
pub mod ranking;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use builder::build_jvg;
pub use error::{BuildError, InvariantViolation, MemoError};
pub use graph::{Jvg, JvgEdge, JvgNode, JvgNodeKind, NodeId, NodeKindTag};
pub use options::BuildOptions;
