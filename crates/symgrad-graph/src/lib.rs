//! An arena-based operator graph.
//!
//! Values and operators live in two vectors owned by [`Graph`]. They refer to
//! each other through [`ValueId`] and [`OpId`] indices, so a value can be read
//! by any number of downstream operators without any ownership ambiguity.
//!
//! Operators are created together with their outputs and may only read values
//! that already exist, so every graph built through this API is acyclic.

pub mod builder;
pub mod traversal;

use std::fmt;

use thiserror::Error;

pub use builder::OpBuilder;

/// A unique identifier for a value in the graph.
/// It's a wrapper around usize to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(usize);

impl ValueId {
    /// Position of the value in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ValueId {
    fn from(id: usize) -> Self {
        ValueId(id)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A unique identifier for an operator in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(usize);

impl OpId {
    /// Position of the operator in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for OpId {
    fn from(id: usize) -> Self {
        OpId(id)
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Errors raised while building a graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An operator referenced a value that is not part of this graph.
    #[error("Unknown value: {0}")]
    UnknownValue(ValueId),

    /// Operators read at least one value.
    #[error("Operator must have at least one input")]
    NoInputs,

    /// Operators produce at least one value.
    #[error("Operator must have at least one output")]
    NoOutputs,
}

/// A symbolic value: either a graph input or the output of an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueNode {
    owner: Option<OpId>,
    name: Option<String>,
}

impl ValueNode {
    /// The operator that produced this value, `None` for a leaf.
    pub fn owner(&self) -> Option<OpId> {
        self.owner
    }

    /// Optional debug name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True if no operator produced this value.
    pub fn is_leaf(&self) -> bool {
        self.owner.is_none()
    }
}

/// An operator together with its ordered inputs and outputs.
/// The `O` payload is whatever the consumer of the graph attaches to it.
pub struct OpNode<O> {
    /// The data held by the operator.
    pub payload: O,
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
}

impl<O> OpNode<O> {
    /// Values read by the operator, in declaration order.
    pub fn inputs(&self) -> &[ValueId] {
        &self.inputs
    }

    /// Values produced by the operator, in declaration order.
    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }
}

/// Read-only access to the structure of a graph.
///
/// This is everything a traversal needs to know about a graph: who produced a
/// value, what an operator reads and writes, and what it carries.
pub trait GraphView {
    /// Operator payload type.
    type Op;

    /// The operator that produced `value`, or `None` for a leaf or unknown value.
    fn owner(&self, value: ValueId) -> Option<OpId>;

    /// Ordered inputs of `op`. Empty for an unknown operator.
    fn inputs(&self, op: OpId) -> &[ValueId];

    /// Ordered outputs of `op`. Empty for an unknown operator.
    fn outputs(&self, op: OpId) -> &[ValueId];

    /// The payload attached to `op`.
    fn payload(&self, op: OpId) -> Option<&Self::Op>;
}

/// Represents an entire graph of values and operators.
/// It owns everything in arena-style vectors.
pub struct Graph<O> {
    values: Vec<ValueNode>,
    ops: Vec<OpNode<O>>,
}

impl<O> Graph<O> {
    /// Creates a new, empty graph.
    pub fn new() -> Self {
        Graph {
            values: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Adds a named leaf value and returns its ID.
    pub fn input(&mut self, name: impl Into<String>) -> ValueId {
        self.push_value(None, Some(name.into()))
    }

    /// Adds an unnamed leaf value and returns its ID.
    pub fn leaf(&mut self) -> ValueId {
        self.push_value(None, None)
    }

    /// Starts building an operator carrying `payload`.
    pub fn op(&mut self, payload: O) -> OpBuilder<'_, O> {
        OpBuilder::new(self, payload)
    }

    /// Adds an operator reading `inputs` and producing `num_outputs` fresh values.
    pub fn add_op(
        &mut self,
        payload: O,
        inputs: Vec<ValueId>,
        num_outputs: usize,
    ) -> Result<OpId, GraphError> {
        if inputs.is_empty() {
            return Err(GraphError::NoInputs);
        }
        if num_outputs == 0 {
            return Err(GraphError::NoOutputs);
        }
        if let Some(&unknown) = inputs.iter().find(|v| !self.contains_value(**v)) {
            return Err(GraphError::UnknownValue(unknown));
        }

        let id = OpId(self.ops.len());
        let outputs = (0..num_outputs)
            .map(|_| self.push_value(Some(id), None))
            .collect();
        self.ops.push(OpNode {
            payload,
            inputs,
            outputs,
        });
        log::trace!("added {} with {} outputs", id, num_outputs);
        Ok(id)
    }

    /// Gets a value by its ID.
    pub fn value(&self, id: ValueId) -> Option<&ValueNode> {
        self.values.get(id.0)
    }

    /// Gets an operator by its ID.
    pub fn op_node(&self, id: OpId) -> Option<&OpNode<O>> {
        self.ops.get(id.0)
    }

    /// The operator that produced `value`.
    pub fn owner(&self, value: ValueId) -> Option<OpId> {
        self.value(value).and_then(ValueNode::owner)
    }

    /// Ordered inputs of `op`.
    pub fn inputs(&self, op: OpId) -> &[ValueId] {
        self.op_node(op).map(OpNode::inputs).unwrap_or(&[])
    }

    /// Ordered outputs of `op`.
    pub fn outputs(&self, op: OpId) -> &[ValueId] {
        self.op_node(op).map(OpNode::outputs).unwrap_or(&[])
    }

    /// The `index`-th output of `op`.
    pub fn output(&self, op: OpId, index: usize) -> Option<ValueId> {
        self.outputs(op).get(index).copied()
    }

    /// Debug name of a value, if it has one.
    pub fn name(&self, value: ValueId) -> Option<&str> {
        self.value(value).and_then(ValueNode::name)
    }

    /// True if `value` belongs to this graph.
    pub fn contains_value(&self, value: ValueId) -> bool {
        value.0 < self.values.len()
    }

    /// Returns the total number of values in the graph.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Returns the total number of operators in the graph.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the graph contains no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push_value(&mut self, owner: Option<OpId>, name: Option<String>) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(ValueNode { owner, name });
        id
    }
}

impl<O> Default for Graph<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> GraphView for Graph<O> {
    type Op = O;

    fn owner(&self, value: ValueId) -> Option<OpId> {
        Graph::owner(self, value)
    }

    fn inputs(&self, op: OpId) -> &[ValueId] {
        Graph::inputs(self, op)
    }

    fn outputs(&self, op: OpId) -> &[ValueId] {
        Graph::outputs(self, op)
    }

    fn payload(&self, op: OpId) -> Option<&O> {
        self.op_node(op).map(|node| &node.payload)
    }
}
