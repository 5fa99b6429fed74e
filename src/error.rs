//! Error types for the genetic programming engine.

use std::fmt;

use crate::types::NodeType;

/// Errors raised by tree construction, execution and the breeding loop.
///
/// None of these are retried internally; they propagate to the caller of the
/// operation that raised them.
#[derive(Debug, Clone, PartialEq)]
pub enum GpError {
    /// Invalid creators, operators, weights or vocabulary detected at
    /// construction time, before any generation runs.
    Configuration(String),
    /// A function declares some, but not all, of its parameter and return
    /// types.
    MissingTypeAnnotations {
        /// Name of the offending function.
        function: String,
    },
    /// Child/parent or runtime-binding type incompatibility.
    TypeMismatch {
        /// The type required by the slot or declaration.
        expected: Option<NodeType>,
        /// The type that was actually supplied.
        got: Option<NodeType>,
        /// What was being attached or looked up.
        context: String,
    },
    /// Attempt to attach more children than a function's arity.
    ArityExceeded {
        /// Name of the function node being filled.
        function: String,
        /// The function's declared arity.
        arity: usize,
    },
    /// Execution was called without bindings for these variable terminals.
    MissingBindings(Vec<String>),
    /// Execution was called with bindings that are not in the terminal set.
    ExtraBindings(Vec<String>),
    /// Execution was called on a tree with no root.
    EmptyTree,
    /// A fitness evaluator failed.
    Evaluation(String),
}

impl fmt::Display for GpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            GpError::MissingTypeAnnotations { function } => write!(
                f,
                "function {function} has missing type annotations; \
                 declare all parameter types and the return type, or none"
            ),
            GpError::TypeMismatch {
                expected,
                got,
                context,
            } => {
                write!(f, "type mismatch for {context}: expected {expected:?}, got {got:?}")
            }
            GpError::ArityExceeded { function, arity } => {
                write!(f, "too many children for function {function} (arity {arity})")
            }
            GpError::MissingBindings(names) => {
                write!(f, "missing bindings for variable terminals: {names:?}")
            }
            GpError::ExtraBindings(names) => {
                write!(f, "bindings not present in the terminal set: {names:?}")
            }
            GpError::EmptyTree => write!(f, "tree is empty, cannot execute"),
            GpError::Evaluation(msg) => write!(f, "evaluation error: {msg}"),
        }
    }
}

impl std::error::Error for GpError {}

/// Result type for engine operations.
pub type GpResult<T> = Result<T, GpError>;
