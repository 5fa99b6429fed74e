//! The full creation method.

use rand::RngCore;

use crate::creator::{CreatorConfig, TreeCreator};
use crate::error::GpResult;
use crate::tree::{FunctionNode, Tree, TreeNode, Vocabulary};
use crate::types::NodeType;

/// Creator using the full method: every node strictly below the max depth is
/// a function, every node at the max depth is a terminal, so trees are
/// maximally bushy with all leaves at the same level.
#[derive(Debug, Clone)]
pub struct FullCreator {
    config: CreatorConfig,
}

impl FullCreator {
    /// Create a full-method creator.
    #[must_use]
    pub fn new(config: CreatorConfig) -> Self {
        Self { config }
    }
}

impl TreeCreator for FullCreator {
    fn config(&self) -> &CreatorConfig {
        &self.config
    }

    fn create_tree(&self, tree: &mut Tree, rng: &mut dyn RngCore) -> GpResult<()> {
        let vocabulary = tree.vocabulary().clone();
        let typed = vocabulary.is_typed();
        let root_type = if typed { self.config.root_type } else { None };
        let root = build_full(
            &vocabulary,
            0,
            self.config.init_depth.1,
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
        let typed = vocabulary.is_typed();
        let expected = if typed { expected } else { None };
        build_full(vocabulary, 0, max_depth, expected, typed, rng)
    }
}

/// Recursively build a full-method subtree.
///
/// At `depth < max_depth` a function compatible with the expected type is
/// placed and its children recurse into the declared parameter types; at
/// `depth >= max_depth` a compatible terminal is placed.
fn build_full(
    vocabulary: &Vocabulary,
    depth: usize,
    max_depth: usize,
    expected: Option<NodeType>,
    typed: bool,
    rng: &mut dyn RngCore,
) -> GpResult<TreeNode> {
    if depth >= max_depth {
        return Ok(TreeNode::Terminal(
            vocabulary.random_terminal(expected, rng)?,
        ));
    }
    let function = vocabulary.random_function(expected, rng)?.clone();
    let mut node = FunctionNode::new(function.clone());
    for i in 0..function.arity() {
        let child_type = if typed { function.param_type(i) } else { None };
        let child = build_full(vocabulary, depth + 1, max_depth, child_type, typed, rng)?;
        node.add_child(child, vocabulary.types())?;
    }
    Ok(TreeNode::Function(node))
}
