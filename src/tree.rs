//! Typed tree representation for genetic programming individuals.
//!
//! A program is a tree of two node kinds: function nodes wrapping a callable
//! with fixed arity, and terminal leaves holding constants or named input
//! variables. Nodes are addressed by pre-order index from the owning root;
//! all structural surgery (subtree query and replacement) goes through that
//! addressing.

mod individual;
mod node;

pub use individual::{Bindings, Tree, Vocabulary};
pub use node::{Function, FunctionNode, Terminal, TerminalNode, TreeNode};
