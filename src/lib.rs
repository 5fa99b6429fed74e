// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Arbor: a typed-tree genetic programming engine.
//!
//! This crate evolves typed, tree-shaped programs toward a user-supplied
//! fitness objective. Programs are trees of function nodes and terminal
//! leaves; stochastic creators build them under type and depth constraints,
//! genetic operators rewrite them while preserving type invariants, and a
//! generational breeding loop applies selection pressure with elitism.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │         Breeding Loop               │
//! ├─────────────────────────────────────┤
//! │  Selection │ Crossover │ Mutation   │
//! ├─────────────────────────────────────┤
//! │    Creators (full / grow / half)    │
//! ├─────────────────────────────────────┤
//! │    Typed Tree Nodes + Execution     │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use arbor::{Evolution, EvolutionConfig, Subpopulation};
//!
//! let mut evolution = Evolution::new(subpopulation, evaluator, termination, config);
//! let report = evolution.evolve()?;
//! println!("{}", report.best_of_run);
//! ```

pub mod creator;
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod functions;
pub mod operators;
pub mod population;
pub mod selection;
pub mod tree;
pub mod types;

pub use error::{GpError, GpResult};

// Re-export key types at crate root for convenience
pub use creator::{CreatorConfig, FullCreator, GrowCreator, HalfCreator, TreeCreator};
pub use evolution::{
    Evaluator, Evolution, EvolutionConfig, EvolutionReport, GenerationObserver, GenerationStats,
    TerminationChecker,
};
pub use fitness::Fitness;
pub use operators::{GeneticOperator, SubtreeCrossover, SubtreeMutation};
pub use population::{Subpopulation, SubpopulationConfig};
pub use selection::{SelectionMethod, TournamentSelection};
pub use tree::{Bindings, Function, FunctionNode, Terminal, TerminalNode, Tree, TreeNode, Vocabulary};
pub use types::{NodeType, TypeTable, Value};
