//! Subtree crossover.

use rand::{Rng, RngCore};

use crate::error::{GpError, GpResult};
use crate::operators::GeneticOperator;
use crate::tree::Tree;
use crate::types::NodeType;

/// Subtree crossover: swaps one randomly selected subtree between two
/// parents.
///
/// The second parent's candidate set is restricted to the first pick's
/// declared type (or to the explicit `node_type` filter when one is
/// configured), so the swap always preserves slot-type invariants. When
/// either parent has no matching node the pair is left unchanged.
#[derive(Debug, Clone, Copy)]
pub struct SubtreeCrossover {
    probability: f64,
    node_type: Option<NodeType>,
}

impl SubtreeCrossover {
    /// Create a subtree crossover operator.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when `probability` is outside
    /// `[0, 1]`.
    pub fn new(probability: f64, node_type: Option<NodeType>) -> GpResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(GpError::Configuration(format!(
                "crossover probability {probability} is not in [0, 1]"
            )));
        }
        Ok(Self {
            probability,
            node_type,
        })
    }
}

impl GeneticOperator for SubtreeCrossover {
    fn probability(&self) -> f64 {
        self.probability
    }

    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, individuals: &mut [Tree], rng: &mut dyn RngCore) -> GpResult<()> {
        let [left, right] = individuals else {
            return Err(GpError::Configuration(format!(
                "subtree crossover operates on exactly 2 individuals, got {}",
                individuals.len()
            )));
        };
        if !rng.gen_bool(self.probability) {
            return Ok(());
        }

        let Some((left_index, left_node)) = left.random_subtree(self.node_type, rng) else {
            return Ok(());
        };
        let left_subtree = left_node.clone();

        // Restrict the second pick to the first pick's declared type so the
        // swapped subtrees stay compatible with both parent slots.
        let filter = self.node_type.or(left_subtree.node_type());
        let Some((right_index, right_node)) = right.random_subtree(filter, rng) else {
            return Ok(());
        };
        let right_subtree = right_node.clone();

        left.replace_subtree(left_index, right_subtree)?;
        right.replace_subtree(right_index, left_subtree)?;
        left.fitness_mut().clear();
        right.fitness_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::fitness::Fitness;
    use crate::tree::{Function, FunctionNode, Terminal, TreeNode, Vocabulary};
    use crate::types::Value;

    fn add_inc() -> Function {
        Function::typed(
            "add_inc",
            vec![NodeType::Int, NodeType::Bool],
            NodeType::Int,
            |args| {
                if args[1].as_bool() {
                    Value::Int(args[0].as_i64() + 1)
                } else {
                    Value::Int(args[0].as_i64())
                }
            },
        )
    }

    fn add_inc_tree(flag: bool) -> Tree {
        let vocabulary = Vocabulary::typed(
            vec![add_inc()],
            vec![
                (Terminal::Constant(Value::Int(1)), NodeType::Int),
                (Terminal::Constant(Value::Bool(true)), NodeType::Bool),
                (Terminal::Constant(Value::Bool(false)), NodeType::Bool),
            ],
        )
        .unwrap();
        let mut tree = Tree::new(vocabulary, (1, 1), Fitness::new(0.0, true)).unwrap();
        let root = TreeNode::Function(
            FunctionNode::with_children(
                add_inc(),
                vec![
                    TreeNode::constant(Value::Int(1), Some(NodeType::Int)),
                    TreeNode::constant(Value::Bool(flag), Some(NodeType::Bool)),
                ],
                tree.vocabulary().types(),
            )
            .unwrap(),
        );
        tree.set_root(root);
        tree
    }

    #[test]
    fn test_typed_crossover_swaps_the_only_bool_nodes() {
        // Each parent has exactly one bool-typed node, so the swap is
        // deterministic under the type filter.
        let crossover = SubtreeCrossover::new(1.0, Some(NodeType::Bool)).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..10 {
            let mut pair = [add_inc_tree(true), add_inc_tree(false)];
            crossover.apply(&mut pair, &mut rng).unwrap();

            let first_flag = pair[0].root().unwrap().get(2).unwrap();
            let second_flag = pair[1].root().unwrap().get(2).unwrap();
            assert_eq!(
                first_flag,
                &TreeNode::constant(Value::Bool(false), Some(NodeType::Bool))
            );
            assert_eq!(
                second_flag,
                &TreeNode::constant(Value::Bool(true), Some(NodeType::Bool))
            );
        }
    }

    #[test]
    fn test_crossover_no_matching_node_is_noop() {
        let crossover = SubtreeCrossover::new(1.0, Some(NodeType::Float)).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let mut pair = [add_inc_tree(true), add_inc_tree(false)];
        let before = pair.clone();
        crossover.apply(&mut pair, &mut rng).unwrap();
        assert_eq!(pair[0], before[0]);
        assert_eq!(pair[1], before[1]);
    }

    #[test]
    fn test_crossover_zero_probability_is_noop() {
        let crossover = SubtreeCrossover::new(0.0, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);

        let mut pair = [add_inc_tree(true), add_inc_tree(false)];
        let before = pair.clone();
        crossover.apply(&mut pair, &mut rng).unwrap();
        assert_eq!(pair[0], before[0]);
        assert_eq!(pair[1], before[1]);
    }

    #[test]
    fn test_crossover_clears_fitness_of_modified_pair() {
        let crossover = SubtreeCrossover::new(1.0, Some(NodeType::Bool)).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);

        let mut pair = [add_inc_tree(true), add_inc_tree(false)];
        pair[0].fitness_mut().set_score(0.9);
        pair[1].fitness_mut().set_score(0.1);
        crossover.apply(&mut pair, &mut rng).unwrap();

        assert!(!pair[0].fitness().is_evaluated());
        assert!(!pair[1].fitness().is_evaluated());
    }

    #[test]
    fn test_crossover_rejects_wrong_arity() {
        let crossover = SubtreeCrossover::new(1.0, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(4);

        let mut single = [add_inc_tree(true)];
        let err = crossover.apply(&mut single, &mut rng).unwrap_err();
        assert!(matches!(err, GpError::Configuration(_)));
    }

    #[test]
    fn test_crossover_rejects_bad_probability() {
        assert!(matches!(
            SubtreeCrossover::new(-0.1, None),
            Err(GpError::Configuration(_))
        ));
    }
}
