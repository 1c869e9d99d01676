use jvg_symbolic::SymbolicError;
use thiserror::Error;

/// Failure of a graph construction call.
///
/// The two variants are the only outcomes callers need to tell apart: a
/// specification that turns out to be realizable is an expected, reportable
/// result, while an invariant violation means the memo or the engine's
/// bookkeeping is inconsistent.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No initial state is winning for the environment; the specification is realizable")]
    Realizable,
    #[error("Structural invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl BuildError {
    pub fn is_realizable(&self) -> bool {
        matches!(self, BuildError::Realizable)
    }

    pub fn violation(&self) -> Option<&InvariantViolation> {
        match self {
            BuildError::Invariant(v) => Some(v),
            BuildError::Realizable => None,
        }
    }
}

/// A construction step found the memo or its own bookkeeping inconsistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("malformed memo: {reason}")]
    MalformedMemo { reason: String },
    #[error("ranking edge from rank {from} to rank {to} does not decrease the rank")]
    RankNotDecreasing { from: usize, to: usize },
    #[error("path through rank {rank} is stuck at cell ({row}, {col}) without closing a cycle")]
    PathStuck { rank: usize, row: usize, col: usize },
    #[error(
        "cycle in rank {rank} starting at cell ({row}, {col}) visits rows {visited:?} of {rows}"
    )]
    CycleSkipsRows {
        rank: usize,
        row: usize,
        col: usize,
        visited: Vec<usize>,
        rows: usize,
    },
    #[error("assumption subgraph of rank {rank} has an edge from row {from} to non-consecutive row {to}")]
    NonConsecutiveAssumptionEdge { rank: usize, from: usize, to: usize },
    #[error("ranking graph has no rank node {id}")]
    MissingRankNode { id: usize },
    #[error("rank {rank} has a successor in rank {target}, which is already decomposed")]
    SuccessorIntoDecomposedRank { rank: usize, target: usize },
}

/// Errors raised while loading or validating a memo.
#[derive(Debug, Error)]
pub enum MemoError {
    #[error("Symbolic error: {0}")]
    Symbolic(#[from] SymbolicError),
    #[error("Memo JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read memo file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Memo shape invalid: {0}")]
    Shape(String),
}

impl From<MemoError> for BuildError {
    fn from(err: MemoError) -> Self {
        BuildError::Invariant(InvariantViolation::MalformedMemo {
            reason: err.to_string(),
        })
    }
}
