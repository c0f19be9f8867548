//! Reverse-mode gradient traversal
//!
//! Given seed gradients on some values of a graph, this module propagates
//! them backward through every operator they depend on and returns the
//! accumulated gradient of each value they reach.
//!
//! # Overview
//!
//! - Each operator's payload implements [`GradientRule`], which maps output
//!   gradients to input gradients. The traversal never looks inside it.
//! - Contributions reaching a value from several consumers are merged with
//!   the gradient type's `+` in a [`GradientMap`]. No zero is ever assumed:
//!   a value no contribution reached is simply absent.
//! - An operator is visited once, after all of its consumers, so the output
//!   gradients its rule receives are final.
//!
//! # Example
//!
//! ```
//! use symgrad::prelude::*;
//!
//! // y = x * w
//! let mut graph: Graph<Box<dyn GradientRule<f64>>> = Graph::new();
//! let x = graph.input("x");
//! let w = graph.input("w");
//! let (x_val, w_val) = (3.0, 5.0);
//! let mul = RuleFn::new("mul", move |_: &[ValueId], grads: &[Option<f64>]| {
//!     let g = grads[0].unwrap_or(0.0);
//!     Ok(LocalGrad::Many(vec![Some(g * w_val), Some(g * x_val)]))
//! });
//! let op = graph.op(Box::new(mul)).inputs([x, w]).build().unwrap();
//! let y = graph.outputs(op)[0];
//!
//! let dx_dw: Projection<f64> = grad(&graph, y, [x, w]).unwrap();
//! assert_eq!(dx_dw.into_vec(), vec![Some(5.0), Some(3.0)]);
//! ```
//!
//! # Scheduling
//!
//! Two equivalent strategies are available through [`GradConfig`]:
//! a worklist driven by a count of unfinished consumers per operator
//! (the default), and a single reverse topological order computed up front.
//!
//! [`GradConfig`]: crate::config::GradConfig

mod backward;
mod context;
mod rules;
mod schedule;

pub use backward::{
    Differentiable, grad, grad_sources_inputs, grad_sources_inputs_with, grad_with,
};
pub use context::{GradientMap, Projection, TraversalStats, Wrt};
pub use rules::{GradientRule, LocalGrad, RuleFn, invoke_rule};
