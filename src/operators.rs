//! Genetic operators: structural tree surgery applied during breeding.
//!
//! Operators consume and produce whole individuals. The breeder hands each
//! operator owned clones of the selected parents, so applying an operator
//! never mutates an individual that is still referenced elsewhere.

mod crossover;
mod mutation;

use std::fmt;

use rand::RngCore;

pub use crossover::SubtreeCrossover;
pub use mutation::SubtreeMutation;

use crate::error::GpResult;
use crate::tree::Tree;

/// A stochastic rewriting operator over a fixed number of individuals.
///
/// Each operator owns its application probability: `apply` flips a coin per
/// application and leaves the individuals untouched when it comes up
/// against.
pub trait GeneticOperator: fmt::Debug + Send + Sync {
    /// Probability of the operator actually rewriting on a given
    /// application.
    fn probability(&self) -> f64;

    /// Number of individuals one application operates on.
    fn arity(&self) -> usize;

    /// Apply the operator to exactly [`GeneticOperator::arity`] owned
    /// individuals.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`](crate::GpError::Configuration)
    /// when the slice length does not match the arity, and propagates
    /// surgery failures.
    fn apply(&self, individuals: &mut [Tree], rng: &mut dyn RngCore) -> GpResult<()>;
}
