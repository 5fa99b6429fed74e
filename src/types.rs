//! Declared node types, the subtype relation and runtime values.
//!
//! Trees come in two flavors: typed, where every function and terminal in
//! the vocabulary declares types and construction enforces slot
//! compatibility, and untyped, where no declarations exist and no checks are
//! performed. The absence-of-type sentinel is `Option::None` throughout.

use serde::{Deserialize, Serialize};

/// Declared type tag for functions and terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Boolean values.
    Bool,
    /// Signed integer values.
    Int,
    /// Floating-point values.
    Float,
}

/// Programmer-supplied subtype relation between declared types.
///
/// The relation is reflexive; beyond that only explicitly registered pairs
/// hold. The default table accepts a `Bool` where an `Int` is expected,
/// mirroring the bool/int subtyping the original framework inherited from
/// its host language. Use [`TypeTable::empty`] to tighten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTable {
    pairs: Vec<(NodeType, NodeType)>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self {
            pairs: vec![(NodeType::Bool, NodeType::Int)],
        }
    }
}

impl TypeTable {
    /// A table with no subtype pairs (exact type matches only).
    #[must_use]
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Register `sub` as a subtype of `sup`.
    #[must_use]
    pub fn allow(mut self, sub: NodeType, sup: NodeType) -> Self {
        if !self.pairs.contains(&(sub, sup)) {
            self.pairs.push((sub, sup));
        }
        self
    }

    /// Whether `sub` is a subtype of (or equal to) `sup`.
    #[must_use]
    pub fn is_subtype(&self, sub: NodeType, sup: NodeType) -> bool {
        sub == sup || self.pairs.contains(&(sub, sup))
    }

    /// Whether a declared type may occupy a slot expecting another.
    ///
    /// An untyped side (`None`) always passes: no check is performed.
    #[must_use]
    pub fn is_compatible(&self, declared: Option<NodeType>, expected: Option<NodeType>) -> bool {
        match (declared, expected) {
            (Some(d), Some(e)) => self.is_subtype(d, e),
            _ => true,
        }
    }
}

/// A runtime value produced by tree execution or bound to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
}

impl Value {
    /// The runtime type tag of this value.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::Bool(_) => NodeType::Bool,
            Value::Int(_) => NodeType::Int,
            Value::Float(_) => NodeType::Float,
        }
    }

    /// Numeric view of the value (`false` = 0, `true` = 1).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
        }
    }

    /// Integer view of the value, truncating floats.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Bool(b) => i64::from(*b),
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
        }
    }

    /// Boolean view of the value (numbers are truthy when non-zero).
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => f.abs() > 0.0,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}
