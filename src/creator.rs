//! Stochastic tree creators.
//!
//! Creators build type- and depth-constrained random trees. The full method
//! produces maximally bushy trees of exactly the configured max depth; the
//! grow method produces variable shapes; the half method alternates the two
//! across the created population.

mod full;
mod grow;

use std::fmt;

use rand::RngCore;

pub use full::FullCreator;
pub use grow::{GrowCreator, HalfCreator};
pub(crate) use grow::grow_subtree;

use crate::error::GpResult;
use crate::fitness::Fitness;
use crate::tree::{Tree, TreeNode, Vocabulary};
use crate::types::NodeType;

/// Shared creator configuration.
#[derive(Debug, Clone)]
pub struct CreatorConfig {
    /// Vocabulary the created trees draw from.
    pub vocabulary: Vocabulary,
    /// Min and max depths of initial random trees.
    pub init_depth: (usize, usize),
    /// Bloat penalty weight stored on created fitness state; consumed by
    /// augmented-fitness computation, not by the creator itself.
    pub bloat_weight: f64,
    /// Required declared type of the root, or `None` for no constraint.
    pub root_type: Option<NodeType>,
}

impl CreatorConfig {
    /// Configuration with no bloat penalty and an unconstrained root.
    #[must_use]
    pub fn new(vocabulary: Vocabulary, init_depth: (usize, usize)) -> Self {
        Self {
            vocabulary,
            init_depth,
            bloat_weight: 0.0,
            root_type: None,
        }
    }
}

/// A stochastic constructor of tree individuals.
pub trait TreeCreator: fmt::Debug + Send + Sync {
    /// The creator's configuration.
    fn config(&self) -> &CreatorConfig;

    /// Populate an empty tree with a freshly generated random root.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`](crate::GpError::Configuration)
    /// when the vocabulary has no candidate for a requested slot type.
    fn create_tree(&self, tree: &mut Tree, rng: &mut dyn RngCore) -> GpResult<()>;

    /// Generate a standalone random subtree of at most `max_depth`,
    /// compatible with the expected type. Used by subtree mutation.
    ///
    /// # Errors
    ///
    /// As [`TreeCreator::create_tree`].
    fn build_subtree(
        &self,
        vocabulary: &Vocabulary,
        max_depth: usize,
        expected: Option<NodeType>,
        rng: &mut dyn RngCore,
    ) -> GpResult<TreeNode>;

    /// Create `n` individuals, each with fresh fitness state carrying the
    /// creator's bloat weight and the given ordering sense.
    ///
    /// # Errors
    ///
    /// As [`TreeCreator::create_tree`].
    fn create_individuals(
        &self,
        n: usize,
        higher_is_better: bool,
        rng: &mut dyn RngCore,
    ) -> GpResult<Vec<Tree>> {
        let config = self.config();
        let mut individuals = Vec::with_capacity(n);
        for _ in 0..n {
            let mut tree = Tree::new(
                config.vocabulary.clone(),
                config.init_depth,
                Fitness::new(config.bloat_weight, higher_is_better),
            )?;
            self.create_tree(&mut tree, rng)?;
            individuals.push(tree);
        }
        Ok(individuals)
    }
}
