//! The grow and half creation methods.

use rand::{Rng, RngCore};

use crate::creator::{CreatorConfig, FullCreator, TreeCreator};
use crate::error::{GpError, GpResult};
use crate::fitness::Fitness;
use crate::tree::{FunctionNode, Tree, TreeNode, Vocabulary};
use crate::types::NodeType;

/// Creator using the grow method: functions are forced below the min depth,
/// terminals are forced at the max depth, and in between each node is a
/// terminal with the configured probability. Produces variable-shape trees.
#[derive(Debug, Clone)]
pub struct GrowCreator {
    config: CreatorConfig,
    terminal_probability: f64,
}

impl GrowCreator {
    /// Create a grow-method creator.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when `terminal_probability` is
    /// outside `[0, 1]`.
    pub fn new(config: CreatorConfig, terminal_probability: f64) -> GpResult<Self> {
        if !(0.0..=1.0).contains(&terminal_probability) {
            return Err(GpError::Configuration(format!(
                "terminal probability {terminal_probability} is not in [0, 1]"
            )));
        }
        Ok(Self {
            config,
            terminal_probability,
        })
    }
}

impl TreeCreator for GrowCreator {
    fn config(&self) -> &CreatorConfig {
        &self.config
    }

    fn create_tree(&self, tree: &mut Tree, rng: &mut dyn RngCore) -> GpResult<()> {
        let vocabulary = tree.vocabulary().clone();
        let typed = vocabulary.is_typed();
        let root_type = if typed { self.config.root_type } else { None };
        let root = build_grow(
            &vocabulary,
            0,
            self.config.init_depth,
            self.terminal_probability,
            root_type,
            typed,
            rng,
        )?;
        tree.set_root(root);
        Ok(())
    }

    fn build_subtree(
        &self,
        vocabulary: &Vocabulary,
        max_depth: usize,
        expected: Option<NodeType>,
        rng: &mut dyn RngCore,
    ) -> GpResult<TreeNode> {
        grow_subtree(
            vocabulary,
            max_depth,
            self.terminal_probability,
            expected,
            rng,
        )
    }
}

/// Creator alternating the full and grow methods across the created
/// population: even indices use full, odd indices use grow. Single-tree
/// creation picks one of the two at random.
#[derive(Debug, Clone)]
pub struct HalfCreator {
    full: FullCreator,
    grow: GrowCreator,
}

impl HalfCreator {
    /// Create a half-and-half creator.
    ///
    /// # Errors
    ///
    /// Propagates validation from [`GrowCreator::new`].
    pub fn new(config: CreatorConfig, terminal_probability: f64) -> GpResult<Self> {
        Ok(Self {
            full: FullCreator::new(config.clone()),
            grow: GrowCreator::new(config, terminal_probability)?,
        })
    }
}

impl TreeCreator for HalfCreator {
    fn config(&self) -> &CreatorConfig {
        self.full.config()
    }

    fn create_tree(&self, tree: &mut Tree, rng: &mut dyn RngCore) -> GpResult<()> {
        if rng.gen_bool(0.5) {
            self.full.create_tree(tree, rng)
        } else {
            self.grow.create_tree(tree, rng)
        }
    }

    fn build_subtree(
        &self,
        vocabulary: &Vocabulary,
        max_depth: usize,
        expected: Option<NodeType>,
        rng: &mut dyn RngCore,
    ) -> GpResult<TreeNode> {
        self.grow.build_subtree(vocabulary, max_depth, expected, rng)
    }

    fn create_individuals(
        &self,
        n: usize,
        higher_is_better: bool,
        rng: &mut dyn RngCore,
    ) -> GpResult<Vec<Tree>> {
        let config = self.config();
        let mut individuals = Vec::with_capacity(n);
        for i in 0..n {
            let mut tree = Tree::new(
                config.vocabulary.clone(),
                config.init_depth,
                Fitness::new(config.bloat_weight, higher_is_better),
            )?;
            if i % 2 == 0 {
                self.full.create_tree(&mut tree, rng)?;
            } else {
                self.grow.create_tree(&mut tree, rng)?;
            }
            individuals.push(tree);
        }
        Ok(individuals)
    }
}

/// Grow a standalone random subtree of at most `max_depth`, compatible with
/// the expected type. Shared with subtree mutation, which regenerates
/// subtrees inside existing trees.
pub(crate) fn grow_subtree(
    vocabulary: &Vocabulary,
    max_depth: usize,
    terminal_probability: f64,
    expected: Option<NodeType>,
    rng: &mut dyn RngCore,
) -> GpResult<TreeNode> {
    let typed = vocabulary.is_typed();
    let expected = if typed { expected } else { None };
    build_grow(
        vocabulary,
        0,
        (0, max_depth),
        terminal_probability,
        expected,
        typed,
        rng,
    )
}

/// Recursively build a grow-method subtree.
fn build_grow(
    vocabulary: &Vocabulary,
    depth: usize,
    depth_range: (usize, usize),
    terminal_probability: f64,
    expected: Option<NodeType>,
    typed: bool,
    rng: &mut dyn RngCore,
) -> GpResult<TreeNode> {
    let (min_depth, max_depth) = depth_range;
    let place_terminal = if depth >= max_depth {
        true
    } else if depth < min_depth {
        false
    } else {
        rng.gen_bool(terminal_probability)
    };

    if place_terminal {
        return Ok(TreeNode::Terminal(
            vocabulary.random_terminal(expected, rng)?,
        ));
    }
    let function = vocabulary.random_function(expected, rng)?.clone();
    let mut node = FunctionNode::new(function.clone());
    for i in 0..function.arity() {
        let child_type = if typed { function.param_type(i) } else { None };
        let child = build_grow(
            vocabulary,
            depth + 1,
            depth_range,
            terminal_probability,
            child_type,
            typed,
            rng,
        )?;
        node.add_child(child, vocabulary.types())?;
    }
    Ok(TreeNode::Function(node))
}
