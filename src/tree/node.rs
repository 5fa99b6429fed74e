//! Tree node engine: function and terminal nodes, execution and surgery.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{GpError, GpResult};
use crate::types::{NodeType, TypeTable, Value};

/// A function usable as an internal tree node.
///
/// Holds the function's name, fixed arity, optional full signature and the
/// shared implementation. A signature declares every parameter type followed
/// by the return type; declaring only some of them is a configuration error.
#[derive(Clone)]
pub struct Function {
    name: String,
    arity: usize,
    signature: Option<Vec<NodeType>>,
    apply: Arc<dyn Fn(&[Value]) -> Value + Send + Sync>,
}

impl Function {
    /// Create a function from its parts.
    ///
    /// `signature`, when present, must hold `arity + 1` entries (parameter
    /// types in order, then the return type). An empty signature is treated
    /// as no signature.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::MissingTypeAnnotations`] when the signature length
    /// does not match `arity + 1`.
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        signature: Option<Vec<NodeType>>,
        apply: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> GpResult<Self> {
        let name = name.into();
        let signature = match signature {
            Some(types) if types.is_empty() => None,
            Some(types) => {
                if types.len() != arity + 1 {
                    return Err(GpError::MissingTypeAnnotations { function: name });
                }
                Some(types)
            }
            None => None,
        };
        Ok(Self {
            name,
            arity,
            signature,
            apply: Arc::new(apply),
        })
    }

    /// Create a fully typed function; the arity is the parameter count.
    #[must_use]
    pub fn typed(
        name: impl Into<String>,
        params: Vec<NodeType>,
        ret: NodeType,
        apply: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        let arity = params.len();
        let mut signature = params;
        signature.push(ret);
        Self {
            name: name.into(),
            arity,
            signature: Some(signature),
            apply: Arc::new(apply),
        }
    }

    /// Create an untyped function of the given arity.
    #[must_use]
    pub fn untyped(
        name: impl Into<String>,
        arity: usize,
        apply: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            signature: None,
            apply: Arc::new(apply),
        }
    }

    /// The function's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of arguments the function accepts.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Declared return type, or `None` when untyped.
    #[must_use]
    pub fn return_type(&self) -> Option<NodeType> {
        self.signature.as_ref().and_then(|s| s.last().copied())
    }

    /// Declared type of parameter `index`, or `None` when untyped.
    #[must_use]
    pub fn param_type(&self, index: usize) -> Option<NodeType> {
        self.signature.as_ref().and_then(|s| s.get(index).copied())
    }

    /// Ordered parameter types followed by the return type.
    ///
    /// Untyped functions yield `arity + 1` absence-of-type sentinels.
    #[must_use]
    pub fn func_types(&self) -> Vec<Option<NodeType>> {
        match &self.signature {
            Some(types) => types.iter().copied().map(Some).collect(),
            None => vec![None; self.arity + 1],
        }
    }

    /// Whether the function declares a full signature.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.signature.is_some()
    }

    /// Apply the function to already-evaluated arguments.
    #[must_use]
    pub fn call(&self, args: &[Value]) -> Value {
        (self.apply)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity && self.signature == other.signature
    }
}

/// A leaf value: a constant, or a named input variable bound at execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    /// A literal value embedded in the tree.
    Constant(Value),
    /// A variable resolved from the execution bindings.
    Variable(String),
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Constant(v) => write!(f, "{v}"),
            Terminal::Variable(name) => write!(f, "{name}"),
        }
    }
}

/// An internal node: a function plus its owned children.
///
/// The children sequence is filled incrementally and never exceeds the
/// function's arity.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    function: Function,
    children: Vec<TreeNode>,
}

impl FunctionNode {
    /// Create a childless function node.
    #[must_use]
    pub fn new(function: Function) -> Self {
        Self {
            function,
            children: Vec::new(),
        }
    }

    /// Create a function node and attach the given children in order.
    ///
    /// # Errors
    ///
    /// Propagates [`GpError::ArityExceeded`] and [`GpError::TypeMismatch`]
    /// from [`FunctionNode::add_child`].
    pub fn with_children(
        function: Function,
        children: Vec<TreeNode>,
        types: &TypeTable,
    ) -> GpResult<Self> {
        let mut node = Self::new(function);
        for child in children {
            node.add_child(child, types)?;
        }
        Ok(node)
    }

    /// Attach the next child.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::ArityExceeded`] when the node already holds
    /// `arity` children, and [`GpError::TypeMismatch`] when the child's
    /// declared type is not a subtype of the expected parameter type (no
    /// check is performed when either side is untyped).
    pub fn add_child(&mut self, child: TreeNode, types: &TypeTable) -> GpResult<()> {
        let index = self.children.len();
        if index >= self.function.arity() {
            return Err(GpError::ArityExceeded {
                function: self.function.name().to_string(),
                arity: self.function.arity(),
            });
        }
        let expected = self.function.param_type(index);
        if !types.is_compatible(child.node_type(), expected) {
            return Err(GpError::TypeMismatch {
                expected,
                got: child.node_type(),
                context: format!("child {index} of {}", self.function.name()),
            });
        }
        self.children.push(child);
        Ok(())
    }

    /// The wrapped function.
    #[must_use]
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// The node's children, in argument order.
    #[must_use]
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Whether the node holds exactly `arity` children.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.children.len() == self.function.arity()
    }
}

/// A leaf node: a terminal with an optional declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalNode {
    value: Terminal,
    node_type: Option<NodeType>,
}

impl TerminalNode {
    /// Create a terminal node.
    #[must_use]
    pub fn new(value: Terminal, node_type: Option<NodeType>) -> Self {
        Self { value, node_type }
    }

    /// The terminal value.
    #[must_use]
    pub fn value(&self) -> &Terminal {
        &self.value
    }
}

/// A node of a genetic programming tree.
///
/// Closed over exactly two variants so that execution, traversal, printing
/// and equality stay exhaustively matchable.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Internal node applying a function to its children's results.
    Function(FunctionNode),
    /// Leaf node yielding a constant or a bound variable.
    Terminal(TerminalNode),
}

impl TreeNode {
    /// Shorthand for a constant leaf.
    #[must_use]
    pub fn constant(value: Value, node_type: Option<NodeType>) -> Self {
        TreeNode::Terminal(TerminalNode::new(Terminal::Constant(value), node_type))
    }

    /// Shorthand for a variable leaf.
    #[must_use]
    pub fn variable(name: impl Into<String>, node_type: Option<NodeType>) -> Self {
        TreeNode::Terminal(TerminalNode::new(Terminal::Variable(name.into()), node_type))
    }

    /// The node's declared result type, or `None` when untyped.
    #[must_use]
    pub fn node_type(&self) -> Option<NodeType> {
        match self {
            TreeNode::Function(node) => node.function.return_type(),
            TreeNode::Terminal(node) => node.node_type,
        }
    }

    /// Evaluate the subtree rooted here, depth-first.
    ///
    /// Children are fully evaluated in order before the parent function is
    /// applied. Variable terminals look their value up in `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::MissingBindings`] when a variable has no binding
    /// and [`GpError::TypeMismatch`] when a bound value's runtime type
    /// differs from the terminal's declared type.
    pub fn execute(&self, bindings: &HashMap<String, Value>) -> GpResult<Value> {
        match self {
            TreeNode::Function(node) => {
                let mut args = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    args.push(child.execute(bindings)?);
                }
                Ok(node.function.call(&args))
            }
            TreeNode::Terminal(node) => match &node.value {
                Terminal::Constant(value) => Ok(*value),
                Terminal::Variable(name) => {
                    let value = *bindings
                        .get(name)
                        .ok_or_else(|| GpError::MissingBindings(vec![name.clone()]))?;
                    if let Some(declared) = node.node_type {
                        if value.node_type() != declared {
                            return Err(GpError::TypeMismatch {
                                expected: Some(declared),
                                got: Some(value.node_type()),
                                context: format!("binding for variable {name}"),
                            });
                        }
                    }
                    Ok(value)
                }
            },
        }
    }

    /// Maximal path length to a leaf: 0 for a terminal, at least 1 for a
    /// function node.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Terminal(_) => 0,
            TreeNode::Function(node) => {
                1 + node
                    .children
                    .iter()
                    .map(TreeNode::depth)
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Number of nodes in the subtree rooted here.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            TreeNode::Terminal(_) => 1,
            TreeNode::Function(node) => {
                1 + node.children.iter().map(TreeNode::size).sum::<usize>()
            }
        }
    }

    /// All nodes (self and descendants, pre-order) satisfying `predicate`.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Vec<&TreeNode>
    where
        F: Fn(&TreeNode) -> bool,
    {
        let mut nodes = Vec::new();
        self.collect_filtered(&predicate, &mut nodes);
        nodes
    }

    fn collect_filtered<'a, F>(&'a self, predicate: &F, nodes: &mut Vec<&'a TreeNode>)
    where
        F: Fn(&TreeNode) -> bool,
    {
        if predicate(self) {
            nodes.push(self);
        }
        if let TreeNode::Function(node) = self {
            for child in &node.children {
                child.collect_filtered(predicate, nodes);
            }
        }
    }

    /// Pre-order indices of all nodes satisfying `predicate`.
    ///
    /// The indices address nodes for [`TreeNode::get`] and
    /// [`TreeNode::replace`]; index 0 is this node itself.
    #[must_use]
    pub fn filter_indices<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&TreeNode) -> bool,
    {
        let mut indices = Vec::new();
        let mut next = 0;
        self.collect_indices(&predicate, &mut next, &mut indices);
        indices
    }

    fn collect_indices<F>(&self, predicate: &F, next: &mut usize, indices: &mut Vec<usize>)
    where
        F: Fn(&TreeNode) -> bool,
    {
        if predicate(self) {
            indices.push(*next);
        }
        *next += 1;
        if let TreeNode::Function(node) = self {
            for child in &node.children {
                child.collect_indices(predicate, next, indices);
            }
        }
    }

    /// The node at the given pre-order index, if any.
    #[must_use]
    pub fn get(&self, mut index: usize) -> Option<&TreeNode> {
        if index == 0 {
            return Some(self);
        }
        index -= 1;
        if let TreeNode::Function(node) = self {
            for child in &node.children {
                let span = child.size();
                if index < span {
                    return child.get(index);
                }
                index -= span;
            }
        }
        None
    }

    /// Substitute the subtree at the given pre-order index.
    ///
    /// Ownership of the removed subtree is released to the caller; the new
    /// subtree is owned by the former parent slot (or becomes the node
    /// itself for index 0). No type check is performed here; callers that
    /// must preserve type invariants restrict the replacement's type first.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when the index is out of range.
    pub fn replace(&mut self, mut index: usize, new: TreeNode) -> GpResult<TreeNode> {
        if index == 0 {
            return Ok(std::mem::replace(self, new));
        }
        index -= 1;
        if let TreeNode::Function(node) = self {
            for child in &mut node.children {
                let span = child.size();
                if index < span {
                    return child.replace(index, new);
                }
                index -= span;
            }
        }
        Err(GpError::Configuration(format!(
            "subtree index {} out of range",
            index + 1
        )))
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeNode::Terminal(node) => write!(f, "{}", node.value),
            TreeNode::Function(node) => {
                write!(f, "{}(", node.function.name())?;
                for (i, child) in node.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add2ints() -> Function {
        Function::typed(
            "add2ints",
            vec![NodeType::Int, NodeType::Int],
            NodeType::Int,
            |args| Value::Int(args[0].as_i64().saturating_add(args[1].as_i64())),
        )
    }

    fn untyped_add() -> Function {
        Function::untyped("add", 2, |args| {
            Value::Float(args[0].as_f64() + args[1].as_f64())
        })
    }

    #[test]
    fn test_add_child_rejects_bad_type() {
        let table = TypeTable::default();
        let mut node = FunctionNode::new(add2ints());
        let child = TreeNode::constant(Value::Float(1.0), Some(NodeType::Float));

        let err = node.add_child(child, &table).unwrap_err();
        assert!(matches!(err, GpError::TypeMismatch { .. }));
    }

    #[test]
    fn test_add_child_accepts_subtype() {
        // Bool is a subtype of Int in the default table.
        let table = TypeTable::default();
        let mut node = FunctionNode::new(add2ints());
        let child = TreeNode::constant(Value::Bool(true), Some(NodeType::Bool));

        assert!(node.add_child(child, &table).is_ok());
    }

    #[test]
    fn test_add_child_skips_check_when_untyped() {
        let table = TypeTable::default();

        // Untyped child under a typed function.
        let mut typed = FunctionNode::new(add2ints());
        assert!(typed
            .add_child(TreeNode::constant(Value::Int(1), None), &table)
            .is_ok());

        // Typed child under an untyped function.
        let mut untyped = FunctionNode::new(untyped_add());
        assert!(untyped
            .add_child(
                TreeNode::constant(Value::Int(1), Some(NodeType::Int)),
                &table
            )
            .is_ok());
    }

    #[test]
    fn test_add_child_rejects_arity_overflow() {
        let table = TypeTable::default();
        let leaf = || TreeNode::constant(Value::Int(1), Some(NodeType::Int));
        let mut node = FunctionNode::new(add2ints());
        node.add_child(leaf(), &table).unwrap();
        node.add_child(leaf(), &table).unwrap();

        let err = node.add_child(leaf(), &table).unwrap_err();
        assert_eq!(
            err,
            GpError::ArityExceeded {
                function: "add2ints".to_string(),
                arity: 2,
            }
        );
    }

    #[test]
    fn test_depth_and_size_laws() {
        let table = TypeTable::default();
        let leaf = TreeNode::constant(Value::Int(1), Some(NodeType::Int));
        assert_eq!(leaf.depth(), 0);
        assert_eq!(leaf.size(), 1);

        let inner = TreeNode::Function(
            FunctionNode::with_children(
                add2ints(),
                vec![
                    TreeNode::constant(Value::Int(1), Some(NodeType::Int)),
                    TreeNode::constant(Value::Int(2), Some(NodeType::Int)),
                ],
                &table,
            )
            .unwrap(),
        );
        let root = TreeNode::Function(
            FunctionNode::with_children(
                add2ints(),
                vec![inner, TreeNode::constant(Value::Int(3), Some(NodeType::Int))],
                &table,
            )
            .unwrap(),
        );

        assert_eq!(root.depth(), 2);
        assert_eq!(root.size(), 5);
    }

    #[test]
    fn test_childless_function_depth_is_one() {
        let zero = Function::typed("zero", Vec::new(), NodeType::Int, |_| Value::Int(0));
        let node = TreeNode::Function(FunctionNode::new(zero));
        assert_eq!(node.depth(), 1);
        assert_eq!(node.size(), 1);
    }

    #[test]
    fn test_execute_post_order() {
        let table = TypeTable::default();
        let root = TreeNode::Function(
            FunctionNode::with_children(
                add2ints(),
                vec![
                    TreeNode::constant(Value::Int(1), Some(NodeType::Int)),
                    TreeNode::constant(Value::Int(2), Some(NodeType::Int)),
                ],
                &table,
            )
            .unwrap(),
        );
        let result = root.execute(&HashMap::new()).unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn test_execute_binding_type_check() {
        let node = TreeNode::variable("x", Some(NodeType::Int));
        let mut bindings = HashMap::new();
        bindings.insert("x".to_string(), Value::Float(1.5));

        let err = node.execute(&bindings).unwrap_err();
        assert!(matches!(err, GpError::TypeMismatch { .. }));

        bindings.insert("x".to_string(), Value::Int(7));
        assert_eq!(node.execute(&bindings).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_func_types_untyped_sentinels() {
        assert_eq!(untyped_add().func_types(), vec![None, None, None]);
        assert_eq!(
            add2ints().func_types(),
            vec![
                Some(NodeType::Int),
                Some(NodeType::Int),
                Some(NodeType::Int)
            ]
        );
    }

    #[test]
    fn test_partial_signature_is_error() {
        let result = Function::new("half_typed", 2, Some(vec![NodeType::Int]), |_| Value::Int(0));
        assert!(matches!(
            result,
            Err(GpError::MissingTypeAnnotations { .. })
        ));
    }

    #[test]
    fn test_get_and_replace_by_preorder_index() {
        let table = TypeTable::default();
        let mut root = TreeNode::Function(
            FunctionNode::with_children(
                add2ints(),
                vec![
                    TreeNode::constant(Value::Int(1), Some(NodeType::Int)),
                    TreeNode::constant(Value::Int(2), Some(NodeType::Int)),
                ],
                &table,
            )
            .unwrap(),
        );

        assert_eq!(root.get(0).unwrap().size(), 3);
        assert_eq!(
            root.get(2).unwrap(),
            &TreeNode::constant(Value::Int(2), Some(NodeType::Int))
        );
        assert!(root.get(3).is_none());

        let old = root
            .replace(2, TreeNode::constant(Value::Int(9), Some(NodeType::Int)))
            .unwrap();
        assert_eq!(old, TreeNode::constant(Value::Int(2), Some(NodeType::Int)));
        assert_eq!(root.execute(&HashMap::new()).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_structural_equality() {
        let table = TypeTable::default();
        let build = |a: i64, b: i64| {
            TreeNode::Function(
                FunctionNode::with_children(
                    add2ints(),
                    vec![
                        TreeNode::constant(Value::Int(a), Some(NodeType::Int)),
                        TreeNode::constant(Value::Int(b), Some(NodeType::Int)),
                    ],
                    &table,
                )
                .unwrap(),
            )
        };
        assert_eq!(build(1, 2), build(1, 2));
        assert_ne!(build(1, 2), build(2, 1));
    }

    #[test]
    fn test_filter_preorder() {
        let table = TypeTable::default();
        let root = TreeNode::Function(
            FunctionNode::with_children(
                add2ints(),
                vec![
                    TreeNode::constant(Value::Int(1), Some(NodeType::Int)),
                    TreeNode::constant(Value::Int(2), Some(NodeType::Int)),
                ],
                &table,
            )
            .unwrap(),
        );

        let terminals = root.filter(|n| matches!(n, TreeNode::Terminal(_)));
        assert_eq!(terminals.len(), 2);

        let indices = root.filter_indices(|n| matches!(n, TreeNode::Terminal(_)));
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_display() {
        let table = TypeTable::default();
        let root = TreeNode::Function(
            FunctionNode::with_children(
                add2ints(),
                vec![
                    TreeNode::variable("x", Some(NodeType::Int)),
                    TreeNode::constant(Value::Int(2), Some(NodeType::Int)),
                ],
                &table,
            )
            .unwrap(),
        );
        assert_eq!(root.to_string(), "add2ints(x, 2)");
    }
}
