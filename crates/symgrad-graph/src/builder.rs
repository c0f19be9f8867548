//! A builder for adding operators to a `Graph` fluently.

use crate::{Graph, GraphError, OpId, ValueId};

/// A builder for one operator.
///
/// ```
/// use symgrad_graph::Graph;
///
/// let mut graph: Graph<&str> = Graph::new();
/// let x = graph.input("x");
/// let y = graph.input("y");
/// let op = graph.op("mul").input(x).input(y).build().unwrap();
/// assert_eq!(graph.outputs(op).len(), 1);
/// ```
pub struct OpBuilder<'g, O> {
    graph: &'g mut Graph<O>,
    payload: O,
    inputs: Vec<ValueId>,
    num_outputs: usize,
}

impl<'g, O> OpBuilder<'g, O> {
    pub(crate) fn new(graph: &'g mut Graph<O>, payload: O) -> Self {
        Self {
            graph,
            payload,
            inputs: Vec::new(),
            num_outputs: 1,
        }
    }

    /// Appends one input.
    pub fn input(mut self, value: ValueId) -> Self {
        self.inputs.push(value);
        self
    }

    /// Appends several inputs in order.
    pub fn inputs(mut self, values: impl IntoIterator<Item = ValueId>) -> Self {
        self.inputs.extend(values);
        self
    }

    /// Sets the number of outputs (defaults to one).
    pub fn outputs(mut self, count: usize) -> Self {
        self.num_outputs = count;
        self
    }

    /// Consumes the builder and adds the operator to the graph.
    pub fn build(self) -> Result<OpId, GraphError> {
        self.graph
            .add_op(self.payload, self.inputs, self.num_outputs)
    }
}
