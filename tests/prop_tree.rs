//! Property-based tests for tree construction and genetic operators.
//!
//! These tests verify structural laws of random trees and the invariants of
//! subtree surgery. Run with: cargo test --release prop_tree

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use arbor::functions::{add2ints, gt2floats, mul2floats, untyped_add, untyped_mul};
use arbor::{
    CreatorConfig, FullCreator, GeneticOperator, GrowCreator, NodeType, SubtreeMutation, Terminal,
    TreeCreator, TreeNode, TypeTable, Value, Vocabulary,
};

fn untyped_vocabulary() -> Vocabulary {
    Vocabulary::untyped(
        vec![untyped_add(), untyped_mul()],
        vec![
            Terminal::Variable("x".to_string()),
            Terminal::Constant(Value::Float(1.0)),
            Terminal::Constant(Value::Float(2.0)),
        ],
    )
    .unwrap()
}

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

/// Every child's declared type is compatible with its parent's slot type.
fn type_valid(node: &TreeNode, types: &TypeTable) -> bool {
    match node {
        TreeNode::Terminal(_) => true,
        TreeNode::Function(function_node) => {
            function_node.children().iter().enumerate().all(|(i, child)| {
                types.is_compatible(child.node_type(), function_node.function().param_type(i))
                    && type_valid(child, types)
            })
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Grow trees stay within the configured depth bounds.
    #[test]
    fn prop_grow_depth_bounds(seed in any::<u64>(), min in 1usize..3, extra in 0usize..3) {
        let max = min + extra;
        let creator = GrowCreator::new(
            CreatorConfig::new(untyped_vocabulary(), (min, max)),
            0.4,
        ).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);

        let individuals = creator.create_individuals(4, true, &mut rng).unwrap();
        for tree in &individuals {
            prop_assert!(tree.depth() >= min);
            prop_assert!(tree.depth() <= max);
        }
    }

    /// Full trees always reach exactly the max depth.
    #[test]
    fn prop_full_exact_depth(seed in any::<u64>(), depth in 1usize..5) {
        let creator = FullCreator::new(
            CreatorConfig::new(untyped_vocabulary(), (depth, depth)),
        );
        let mut rng = SmallRng::seed_from_u64(seed);

        let individuals = creator.create_individuals(3, true, &mut rng).unwrap();
        for tree in &individuals {
            prop_assert_eq!(tree.depth(), depth);
        }
    }

    /// Pre-order addressing covers exactly the node count, and a leaf always
    /// has fewer nodes than its parent tree.
    #[test]
    fn prop_preorder_addressing_is_total(seed in any::<u64>()) {
        let creator = GrowCreator::new(
            CreatorConfig::new(untyped_vocabulary(), (1, 4)),
            0.4,
        ).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);
        let tree = creator.create_individuals(1, true, &mut rng).unwrap().remove(0);
        let root = tree.root().unwrap();

        let size = root.size();
        prop_assert!(size >= tree.depth() + 1);
        for index in 0..size {
            prop_assert!(root.get(index).is_some());
        }
        prop_assert!(root.get(size).is_none());
    }

    /// Swapping the same pair of subtrees twice restores both original trees
    /// bit for bit.
    #[test]
    fn prop_crossover_round_trip(seed in any::<u64>()) {
        let creator = GrowCreator::new(
            CreatorConfig::new(untyped_vocabulary(), (1, 4)),
            0.4,
        ).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut individuals = creator.create_individuals(2, true, &mut rng).unwrap();
        let second = individuals.pop().unwrap();
        let first = individuals.pop().unwrap();

        let (first_index, _) = first.random_subtree(None, &mut rng).unwrap();
        let (second_index, second_node) = second.random_subtree(None, &mut rng).unwrap();
        let donor = second_node.clone();

        let mut first_changed = first.clone();
        let mut second_changed = second.clone();
        let from_first = first_changed.replace_subtree(first_index, donor).unwrap();
        let from_second = second_changed.replace_subtree(second_index, from_first).unwrap();

        // Swap back.
        let back_first = second_changed.replace_subtree(second_index, from_second).unwrap();
        let back_donor = first_changed.replace_subtree(first_index, back_first).unwrap();

        prop_assert_eq!(&first_changed, &first);
        prop_assert_eq!(&second_changed, &second);
        prop_assert_eq!(&back_donor, second.root().unwrap().get(second_index).unwrap());
    }

    /// Subtree mutation never breaks type validity on typed trees.
    #[test]
    fn prop_mutation_preserves_types(seed in any::<u64>()) {
        let creator = FullCreator::new(CreatorConfig::new(typed_vocabulary(), (2, 3)));
        let mutation = SubtreeMutation::new(1.0, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);

        let mut individuals = creator.create_individuals(1, true, &mut rng).unwrap();
        for _ in 0..10 {
            mutation.apply(&mut individuals, &mut rng).unwrap();
            let tree = &individuals[0];
            prop_assert!(type_valid(tree.root().unwrap(), tree.vocabulary().types()));
        }
    }

    /// Executing a typed random tree yields a value of the root's declared
    /// type.
    #[test]
    fn prop_execution_matches_declared_type(seed in any::<u64>()) {
        let creator = FullCreator::new(CreatorConfig::new(typed_vocabulary(), (1, 3)));
        let mut rng = SmallRng::seed_from_u64(seed);
        let tree = creator.create_individuals(1, true, &mut rng).unwrap().remove(0);

        let mut bindings = arbor::Bindings::new();
        bindings.insert("x".to_string(), Value::Float(0.25));
        let result = tree.execute(&bindings).unwrap();
        let declared = tree.root().unwrap().node_type().unwrap();
        prop_assert!(
            tree.vocabulary().types().is_subtype(result.node_type(), declared)
        );
    }
}
