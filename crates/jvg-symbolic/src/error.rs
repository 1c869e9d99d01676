use thiserror::Error;

/// Errors raised while declaring variables, compiling formulas or sizing a backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolicError {
    #[error("Variable '{0}' is declared more than once")]
    DuplicateVariable(String),
    #[error("Variable '{0}' has an empty domain")]
    EmptyDomain(String),
    #[error("Variable '{0}' declares value '{1}' more than once")]
    DuplicateValue(String, String),
    #[error("Invalid variable name '{0}' (names must be non-empty and must not end with a prime)")]
    InvalidName(String),
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("Unknown value '{value}' for variable '{var}'")]
    UnknownValue { var: String, value: String },
    #[error("Variables '{var}' and '{other}' share no value names")]
    DisjointDomains { var: String, other: String },
    #[error("State space of {size} valuations exceeds the explicit backend limit of {limit}")]
    UniverseTooLarge { size: u128, limit: u64 },
}
