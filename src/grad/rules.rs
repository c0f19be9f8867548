//! Operator gradient rules
//!
//! An operator's payload implements [`GradientRule`]: given its inputs and the
//! gradients of its outputs, it returns the gradients of its inputs. The
//! traversal never calls a rule directly; it goes through [`invoke_rule`], which
//! checks and normalizes what the rule returned.

use symgrad_graph::{OpId, ValueId};

use crate::error::{GradError, Result, RuleError};

// ============================================================================
// Rule result
// ============================================================================

/// What a gradient rule returns.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalGrad<G> {
    /// One slot per input, in input order. `None` means no gradient flows
    /// into that input through this operator.
    Many(Vec<Option<G>>),
    /// A bare gradient, shorthand for a single-input operator.
    Single(G),
    /// The gradient is undefined or not implemented.
    Undefined,
}

impl<G> From<Vec<Option<G>>> for LocalGrad<G> {
    fn from(grads: Vec<Option<G>>) -> Self {
        LocalGrad::Many(grads)
    }
}

// ============================================================================
// GradientRule
// ============================================================================

/// The local gradient of an operator.
pub trait GradientRule<G> {
    /// Compute input gradients from `output_grads`, which is aligned with the
    /// operator's outputs and holds `None` where no gradient arrived.
    fn local_grad(
        &self,
        inputs: &[ValueId],
        output_grads: &[Option<G>],
    ) -> std::result::Result<LocalGrad<G>, RuleError>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<G, R> GradientRule<G> for Box<R>
where
    R: GradientRule<G> + ?Sized,
{
    fn local_grad(
        &self,
        inputs: &[ValueId],
        output_grads: &[Option<G>],
    ) -> std::result::Result<LocalGrad<G>, RuleError> {
        (**self).local_grad(inputs, output_grads)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<G, R> GradientRule<G> for &R
where
    R: GradientRule<G> + ?Sized,
{
    fn local_grad(
        &self,
        inputs: &[ValueId],
        output_grads: &[Option<G>],
    ) -> std::result::Result<LocalGrad<G>, RuleError> {
        (**self).local_grad(inputs, output_grads)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A gradient rule backed by a closure.
///
/// ```
/// use symgrad::grad::{GradientRule, LocalGrad, RuleFn};
///
/// let double = RuleFn::new("double", |_inputs, grads: &[Option<f64>]| {
///     Ok(LocalGrad::Many(vec![grads[0].map(|g| 2.0 * g)]))
/// });
/// assert_eq!(double.name(), "double");
/// ```
pub struct RuleFn<F> {
    name: String,
    f: F,
}

impl<F> RuleFn<F> {
    pub fn new<G>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[ValueId], &[Option<G>]) -> std::result::Result<LocalGrad<G>, RuleError>,
    {
        Self {
            name: name.into(),
            f,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<G, F> GradientRule<G> for RuleFn<F>
where
    F: Fn(&[ValueId], &[Option<G>]) -> std::result::Result<LocalGrad<G>, RuleError>,
{
    fn local_grad(
        &self,
        inputs: &[ValueId],
        output_grads: &[Option<G>],
    ) -> std::result::Result<LocalGrad<G>, RuleError> {
        (self.f)(inputs, output_grads)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Shim
// ============================================================================

/// Call `rule` for `op` and check its result.
///
/// On success the returned vector has exactly one slot per input.
pub fn invoke_rule<G, R>(
    op: OpId,
    rule: &R,
    inputs: &[ValueId],
    output_grads: &[Option<G>],
) -> Result<Vec<Option<G>>>
where
    R: GradientRule<G> + ?Sized,
{
    let op_name = || GradientRule::<G>::name(rule).to_string();
    let local = rule
        .local_grad(inputs, output_grads)
        .map_err(|source| GradError::Rule {
            op,
            op_name: op_name(),
            source,
        })?;

    let grads = match local {
        LocalGrad::Many(grads) => grads,
        LocalGrad::Single(grad) => vec![Some(grad)],
        LocalGrad::Undefined => {
            return Err(GradError::RetNone {
                op,
                op_name: op_name(),
            });
        }
    };

    if grads.len() != inputs.len() {
        return Err(GradError::ArityMismatch {
            op,
            op_name: op_name(),
            expected: inputs.len(),
            actual: grads.len(),
        });
    }

    Ok(grads)
}

// ============================================================================
// Tests
// ============================================================================
