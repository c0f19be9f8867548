//! symgrad: reverse-mode gradients over symbolic operator graphs
//!
//! symgrad walks a computation graph backward from seeded values, calls each
//! operator's local gradient rule once, and accumulates the contributions
//! into a gradient for every upstream value.
//!
//! # Architecture
//!
//! - **graph**: the arena graph of values and operators (the `symgrad-graph`
//!   crate, re-exported)
//! - **grad**: the backward traversal, gradient accumulation and rule checking
//! - **config**: traversal settings, overridable from the environment
//! - **error**: error types
//!
//! # Environment Variables
//!
//! - `SYMGRAD_SCHEDULE`: `pending` (default) or `topological`

// ============================================================================
// Core Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod grad;

pub use symgrad_graph as graph;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{GradConfig, Schedule};
pub use error::{ConfigError, GradError, Result, RuleError};
pub use grad::{
    Differentiable, GradientMap, GradientRule, LocalGrad, Projection, RuleFn, Wrt, grad,
    grad_sources_inputs, grad_sources_inputs_with, grad_with,
};
pub use symgrad_graph::{Graph, GraphError, GraphView, OpId, ValueId};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module with commonly used types and traits
pub mod prelude {
    // Graph
    pub use crate::graph::{Graph, GraphView, OpId, ValueId};

    // Gradients
    pub use crate::grad::{
        Differentiable, GradientMap, GradientRule, LocalGrad, Projection, RuleFn, Wrt, grad,
        grad_sources_inputs, grad_with,
    };

    // Configuration and errors
    pub use crate::config::{GradConfig, Schedule};
    pub use crate::error::{GradError, RuleError};
}
