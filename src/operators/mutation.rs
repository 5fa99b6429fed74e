//! Subtree mutation.

use rand::{Rng, RngCore};

use crate::creator::TreeCreator;
use crate::creator::grow_subtree;
use crate::error::{GpError, GpResult};
use crate::operators::GeneticOperator;
use crate::tree::Tree;
use crate::types::NodeType;

/// Terminal probability of the built-in grow builder used when no explicit
/// creator is configured.
const DEFAULT_TERMINAL_PROBABILITY: f64 = 0.5;

/// Subtree mutation: replaces one randomly selected subtree with a freshly
/// generated random subtree of the same declared type.
///
/// The replacement is grown within the mutated tree's init-depth budget from
/// its own vocabulary, unless an explicit creator is supplied.
#[derive(Debug)]
pub struct SubtreeMutation {
    probability: f64,
    node_type: Option<NodeType>,
    creator: Option<Box<dyn TreeCreator>>,
}

impl SubtreeMutation {
    /// Create a subtree mutation operator.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when `probability` is outside
    /// `[0, 1]`.
    pub fn new(probability: f64, node_type: Option<NodeType>) -> GpResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(GpError::Configuration(format!(
                "mutation probability {probability} is not in [0, 1]"
            )));
        }
        Ok(Self {
            probability,
            node_type,
            creator: None,
        })
    }

    /// Delegate replacement generation to an explicit creator instead of the
    /// built-in grow builder.
    #[must_use]
    pub fn with_creator(mut self, creator: Box<dyn TreeCreator>) -> Self {
        self.creator = Some(creator);
        self
    }
}

impl GeneticOperator for SubtreeMutation {
    fn probability(&self) -> f64 {
        self.probability
    }

    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, individuals: &mut [Tree], rng: &mut dyn RngCore) -> GpResult<()> {
        let [tree] = individuals else {
            return Err(GpError::Configuration(format!(
                "subtree mutation operates on exactly 1 individual, got {}",
                individuals.len()
            )));
        };
        if !rng.gen_bool(self.probability) {
            return Ok(());
        }

        let Some((index, node)) = tree.random_subtree(self.node_type, rng) else {
            return Ok(());
        };
        let expected = self.node_type.or(node.node_type());
        let max_depth = tree.init_depth().1;

        let replacement = match &self.creator {
            Some(creator) => creator.build_subtree(tree.vocabulary(), max_depth, expected, rng)?,
            None => grow_subtree(
                tree.vocabulary(),
                max_depth,
                DEFAULT_TERMINAL_PROBABILITY,
                expected,
                rng,
            )?,
        };

        tree.replace_subtree(index, replacement)?;
        tree.fitness_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use crate::creator::{CreatorConfig, FullCreator};
    use crate::functions::{add2ints, gt2floats, mul2floats};
    use crate::tree::{Terminal, TreeNode, Vocabulary};
    use crate::types::{TypeTable, Value};

    fn typed_vocabulary() -> Vocabulary {
        Vocabulary::typed(
            vec![add2ints(), mul2floats(), gt2floats()],
            vec![
                (Terminal::Constant(Value::Int(1)), NodeType::Int),
                (Terminal::Constant(Value::Float(0.5)), NodeType::Float),
                (Terminal::Variable("x".to_string()), NodeType::Float),
            ],
        )
        .unwrap()
    }

    /// Every child's declared type must be compatible with its parent's
    /// expected slot type.
    fn assert_type_valid(node: &TreeNode, types: &TypeTable) {
        if let TreeNode::Function(function_node) = node {
            for (i, child) in function_node.children().iter().enumerate() {
                assert!(
                    types.is_compatible(child.node_type(), function_node.function().param_type(i)),
                    "child {i} of {} violates its slot type",
                    function_node.function().name()
                );
                assert_type_valid(child, types);
            }
        }
    }

    #[test]
    fn test_mutation_preserves_type_validity() {
        let creator = FullCreator::new(CreatorConfig::new(typed_vocabulary(), (2, 3)));
        let mutation = SubtreeMutation::new(1.0, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        let mut individuals = creator.create_individuals(1, true, &mut rng).unwrap();
        for _ in 0..50 {
            mutation.apply(&mut individuals, &mut rng).unwrap();
            let tree = &individuals[0];
            assert_type_valid(tree.root().unwrap(), tree.vocabulary().types());
            assert!(tree.depth() <= 2 * tree.init_depth().1);
        }
    }

    #[test]
    fn test_mutation_with_type_filter() {
        let creator = FullCreator::new(CreatorConfig::new(typed_vocabulary(), (2, 2)));
        let mutation = SubtreeMutation::new(1.0, Some(NodeType::Float)).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);

        let mut individuals = creator.create_individuals(1, true, &mut rng).unwrap();
        for _ in 0..20 {
            mutation.apply(&mut individuals, &mut rng).unwrap();
            let tree = &individuals[0];
            assert_type_valid(tree.root().unwrap(), tree.vocabulary().types());
        }
    }

    #[test]
    fn test_mutation_zero_probability_is_noop() {
        let creator = FullCreator::new(CreatorConfig::new(typed_vocabulary(), (2, 2)));
        let mutation = SubtreeMutation::new(0.0, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);

        let mut individuals = creator.create_individuals(1, true, &mut rng).unwrap();
        let before = individuals[0].clone();
        mutation.apply(&mut individuals, &mut rng).unwrap();
        assert_eq!(individuals[0], before);
    }

    #[test]
    fn test_mutation_clears_fitness() {
        let creator = FullCreator::new(CreatorConfig::new(typed_vocabulary(), (2, 2)));
        let mutation = SubtreeMutation::new(1.0, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);

        let mut individuals = creator.create_individuals(1, true, &mut rng).unwrap();
        individuals[0].fitness_mut().set_score(0.8);
        mutation.apply(&mut individuals, &mut rng).unwrap();
        assert!(!individuals[0].fitness().is_evaluated());
    }

    #[test]
    fn test_mutation_with_explicit_creator() {
        let config = CreatorConfig::new(typed_vocabulary(), (2, 2));
        let creator = FullCreator::new(config.clone());
        let mutation = SubtreeMutation::new(1.0, None)
            .unwrap()
            .with_creator(Box::new(FullCreator::new(config)));
        let mut rng = SmallRng::seed_from_u64(9);

        let mut individuals = creator.create_individuals(1, true, &mut rng).unwrap();
        mutation.apply(&mut individuals, &mut rng).unwrap();
        let tree = &individuals[0];
        assert_type_valid(tree.root().unwrap(), tree.vocabulary().types());
    }
}
