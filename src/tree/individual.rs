//! Tree individuals: one program plus the vocabulary it is built from.

use std::collections::HashMap;
use std::fmt;

use rand::{Rng, RngCore};

use crate::error::{GpError, GpResult};
use crate::fitness::Fitness;
use crate::tree::node::{Function, Terminal, TerminalNode, TreeNode};
use crate::types::{NodeType, TypeTable, Value};

/// Execution-time variable bindings, keyed by terminal name.
pub type Bindings = HashMap<String, Value>;

/// The declared node vocabulary of a tree: allowed functions, allowed
/// terminals with their declared types, and the subtype relation used when
/// attaching children.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    functions: Vec<Function>,
    terminals: Vec<(Terminal, Option<NodeType>)>,
    types: TypeTable,
}

impl Vocabulary {
    /// Create a vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when either list is empty, when
    /// function names repeat, or when terminal entries repeat.
    pub fn new(
        functions: Vec<Function>,
        terminals: Vec<(Terminal, Option<NodeType>)>,
        types: TypeTable,
    ) -> GpResult<Self> {
        if functions.is_empty() {
            return Err(GpError::Configuration(
                "function set cannot be empty".to_string(),
            ));
        }
        if terminals.is_empty() {
            return Err(GpError::Configuration(
                "terminal set cannot be empty".to_string(),
            ));
        }
        for (i, function) in functions.iter().enumerate() {
            if functions[..i].iter().any(|f| f.name() == function.name()) {
                return Err(GpError::Configuration(format!(
                    "duplicate function {} in function set",
                    function.name()
                )));
            }
        }
        for (i, (terminal, _)) in terminals.iter().enumerate() {
            if terminals[..i].iter().any(|(t, _)| t == terminal) {
                return Err(GpError::Configuration(format!(
                    "duplicate terminal {terminal} in terminal set"
                )));
            }
        }
        Ok(Self {
            functions,
            terminals,
            types,
        })
    }

    /// Create a vocabulary where every terminal declares a type, with the
    /// default subtype table.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`Vocabulary::new`].
    pub fn typed(
        functions: Vec<Function>,
        terminals: Vec<(Terminal, NodeType)>,
    ) -> GpResult<Self> {
        let terminals = terminals
            .into_iter()
            .map(|(terminal, ty)| (terminal, Some(ty)))
            .collect();
        Self::new(functions, terminals, TypeTable::default())
    }

    /// Create a vocabulary with no type declarations on terminals.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`Vocabulary::new`].
    pub fn untyped(functions: Vec<Function>, terminals: Vec<Terminal>) -> GpResult<Self> {
        let terminals = terminals
            .into_iter()
            .map(|terminal| (terminal, None))
            .collect();
        Self::new(functions, terminals, TypeTable::default())
    }

    /// The conventional terminal list for 2-D table inputs: float variables
    /// `x0..x{n-1}`, one per column.
    #[must_use]
    pub fn table_terminals(columns: usize) -> Vec<(Terminal, Option<NodeType>)> {
        (0..columns)
            .map(|i| (Terminal::Variable(format!("x{i}")), Some(NodeType::Float)))
            .collect()
    }

    /// Allowed functions, in declaration order.
    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Allowed terminals with their declared types, in declaration order.
    #[must_use]
    pub fn terminals(&self) -> &[(Terminal, Option<NodeType>)] {
        &self.terminals
    }

    /// The subtype relation for this vocabulary.
    #[must_use]
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Typed mode is all or nothing: the vocabulary is typed only when every
    /// function and every terminal declares types. Otherwise creation and
    /// filtering run fully untyped.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.functions.iter().all(Function::is_typed)
            && self.terminals.iter().all(|(_, ty)| ty.is_some())
    }

    /// Names of the variable terminals, in declaration order.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        self.terminals
            .iter()
            .filter_map(|(terminal, _)| match terminal {
                Terminal::Variable(name) => Some(name.as_str()),
                Terminal::Constant(_) => None,
            })
            .collect()
    }

    /// Pick a uniformly random function whose return type may occupy a slot
    /// of the expected type (untyped candidates always qualify).
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when no function qualifies: the
    /// vocabulary is type-incomplete for the requested slot.
    pub fn random_function(
        &self,
        expected: Option<NodeType>,
        rng: &mut dyn RngCore,
    ) -> GpResult<&Function> {
        let candidates: Vec<&Function> = self
            .functions
            .iter()
            .filter(|f| self.types.is_compatible(f.return_type(), expected))
            .collect();
        if candidates.is_empty() {
            return Err(GpError::Configuration(format!(
                "no function in the vocabulary returns {expected:?}"
            )));
        }
        Ok(candidates[rng.gen_range(0..candidates.len())])
    }

    /// Pick a uniformly random terminal compatible with the expected type.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when no terminal qualifies.
    pub fn random_terminal(
        &self,
        expected: Option<NodeType>,
        rng: &mut dyn RngCore,
    ) -> GpResult<TerminalNode> {
        let candidates: Vec<&(Terminal, Option<NodeType>)> = self
            .terminals
            .iter()
            .filter(|(_, ty)| self.types.is_compatible(*ty, expected))
            .collect();
        if candidates.is_empty() {
            return Err(GpError::Configuration(format!(
                "no terminal in the vocabulary matches {expected:?}"
            )));
        }
        let (terminal, ty) = candidates[rng.gen_range(0..candidates.len())];
        Ok(TerminalNode::new(terminal.clone(), *ty))
    }
}

/// One candidate program: a root node, the vocabulary it draws from, the
/// initial-depth range it was created with, and its fitness state.
///
/// Created empty by a creator, populated by recursive construction,
/// evaluated externally, cloned by genetic operators, and discarded when
/// replaced in the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: Option<TreeNode>,
    vocabulary: Vocabulary,
    init_depth: (usize, usize),
    fitness: Fitness,
}

impl Tree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when `init_depth` is inverted.
    pub fn new(
        vocabulary: Vocabulary,
        init_depth: (usize, usize),
        fitness: Fitness,
    ) -> GpResult<Self> {
        if init_depth.0 > init_depth.1 {
            return Err(GpError::Configuration(format!(
                "init_depth min {} exceeds max {}",
                init_depth.0, init_depth.1
            )));
        }
        Ok(Self {
            root: None,
            vocabulary,
            init_depth,
            fitness,
        })
    }

    /// The root node, if the tree has been populated.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Install a root, taking ownership of the subtree.
    pub fn set_root(&mut self, root: TreeNode) {
        self.root = Some(root);
    }

    /// Drop the root, leaving the tree empty.
    pub fn clear(&mut self) {
        self.root = None;
    }

    /// The vocabulary this tree draws from.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Min and max depths of initial random trees.
    #[must_use]
    pub fn init_depth(&self) -> (usize, usize) {
        self.init_depth
    }

    /// Fitness state.
    #[must_use]
    pub fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    /// Mutable fitness state (assigned by evaluators).
    pub fn fitness_mut(&mut self) -> &mut Fitness {
        &mut self.fitness
    }

    /// Augmented fitness for this tree's current size, if evaluated.
    #[must_use]
    pub fn augmented_fitness(&self) -> Option<f64> {
        self.fitness.augmented(self.size())
    }

    /// Node count; 0 for an empty tree.
    #[must_use]
    pub fn size(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::size)
    }

    /// Tree depth; 0 for an empty tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    /// Execute the program against explicit variable bindings.
    ///
    /// The supplied variable set must match the vocabulary's variable
    /// terminals exactly.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::EmptyTree`] when no root exists,
    /// [`GpError::ExtraBindings`] / [`GpError::MissingBindings`] when the
    /// variable sets differ, and propagates execution errors from the nodes.
    pub fn execute(&self, bindings: &Bindings) -> GpResult<Value> {
        let root = self.root.as_ref().ok_or(GpError::EmptyTree)?;
        let variables = self.vocabulary.variables();

        let mut extra: Vec<String> = bindings
            .keys()
            .filter(|name| !variables.contains(&name.as_str()))
            .cloned()
            .collect();
        if !extra.is_empty() {
            extra.sort_unstable();
            return Err(GpError::ExtraBindings(extra));
        }

        let missing: Vec<String> = variables
            .iter()
            .filter(|name| !bindings.contains_key(**name))
            .map(|name| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(GpError::MissingBindings(missing));
        }

        root.execute(bindings)
    }

    /// Execute the program row-wise against a 2-D numeric table.
    ///
    /// Column `i` binds to the variable `x{i}`; every row yields one result,
    /// so a tree that degenerates to a constant still produces one value per
    /// row. The generated `x0..xN` name set must match the vocabulary's
    /// variable terminals exactly.
    ///
    /// # Errors
    ///
    /// As [`Tree::execute`], plus [`GpError::Configuration`] for ragged
    /// rows.
    pub fn execute_table(&self, rows: &[Vec<f64>]) -> GpResult<Vec<Value>> {
        if self.root.is_none() {
            return Err(GpError::EmptyTree);
        }
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let width = first.len();

        let mut results = Vec::with_capacity(rows.len());
        let mut bindings = Bindings::with_capacity(width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GpError::Configuration(format!(
                    "row {i} has {} columns, expected {width}",
                    row.len()
                )));
            }
            bindings.clear();
            for (column, value) in row.iter().enumerate() {
                bindings.insert(format!("x{column}"), Value::Float(*value));
            }
            results.push(self.execute(&bindings)?);
        }
        Ok(results)
    }

    /// A uniformly random node among those whose declared type equals the
    /// optional filter (no filter matches every node), as a pre-order index
    /// plus a borrow. `None` when the tree is empty or nothing matches.
    #[must_use]
    pub fn random_subtree(
        &self,
        node_type: Option<NodeType>,
        rng: &mut dyn RngCore,
    ) -> Option<(usize, &TreeNode)> {
        let root = self.root.as_ref()?;
        let indices = root.filter_indices(|node| match node_type {
            Some(ty) => node.node_type() == Some(ty),
            None => true,
        });
        if indices.is_empty() {
            return None;
        }
        let index = indices[rng.gen_range(0..indices.len())];
        Some((index, root.get(index)?))
    }

    /// Substitute the subtree at a pre-order index (0 swaps the whole root),
    /// releasing and returning the removed subtree.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::EmptyTree`] when no root exists and
    /// [`GpError::Configuration`] for an out-of-range index.
    pub fn replace_subtree(&mut self, index: usize, new: TreeNode) -> GpResult<TreeNode> {
        let root = self.root.as_mut().ok_or(GpError::EmptyTree)?;
        root.replace(index, new)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree({})", self.vocabulary.variables().join(", "))?;
        match &self.root {
            Some(root) => write!(f, " = {root}"),
            None => write!(f, " = <empty>"),
        }
    }
}
