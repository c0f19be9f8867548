//! Backward pass entry points

use std::ops::Add;

use num_traits::One;
use rustc_hash::FxHashSet;
use symgrad_graph::{Graph, GraphView, ValueId};

use super::context::{GradientMap, Projection, Wrt};
use super::rules::GradientRule;
use super::schedule;
use crate::config::GradConfig;
use crate::error::Result;

/// Backpropagate the seeded gradients in `sources` through `view`.
///
/// Each source pairs a value with its seed gradient; a value may be seeded more
/// than once and the seeds add up. A `None` seed contributes nothing.
/// Traversal does not continue above the values in `truncate`, which act as
/// leaves for this call.
///
/// The returned map holds an entry for every value at least one contribution
/// reached. The schedule comes from [`GradConfig::from_env`], falling back to
/// the default when the environment is malformed.
///
/// # Example
///
/// ```
/// use symgrad::grad::{GradientRule, LocalGrad, RuleFn, grad_sources_inputs};
/// use symgrad::graph::{Graph, ValueId};
///
/// let mut graph: Graph<Box<dyn GradientRule<f64>>> = Graph::new();
/// let x = graph.input("x");
/// let double = RuleFn::new("double", |_: &[ValueId], grads: &[Option<f64>]| {
///     Ok(LocalGrad::Many(vec![grads[0].map(|g| 2.0 * g)]))
/// });
/// let op = graph.op(Box::new(double)).input(x).build().unwrap();
/// let y = graph.outputs(op)[0];
///
/// let grads = grad_sources_inputs(&graph, [(y, Some(1.5))], &[]).unwrap();
/// assert_eq!(grads.get(x), Some(&3.0));
/// ```
pub fn grad_sources_inputs<V, G, S>(
    view: &V,
    sources: S,
    truncate: &[ValueId],
) -> Result<GradientMap<G>>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
    S: IntoIterator<Item = (ValueId, Option<G>)>,
{
    grad_sources_inputs_with(
        view,
        sources,
        truncate,
        &GradConfig::from_env_or_default(),
    )
}

/// Like [`grad_sources_inputs`], with an explicit configuration.
pub fn grad_sources_inputs_with<V, G, S>(
    view: &V,
    sources: S,
    truncate: &[ValueId],
    config: &GradConfig,
) -> Result<GradientMap<G>>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
    S: IntoIterator<Item = (ValueId, Option<G>)>,
{
    let truncate: FxHashSet<ValueId> = truncate.iter().copied().collect();
    let mut map = GradientMap::new();
    let mut roots = Vec::new();

    for (value, seed) in sources {
        roots.push(value);
        match seed {
            Some(seed) => map.add_contribution(value, seed),
            None => log::trace!("seed for {} is None", value),
        }
    }

    schedule::run(view, &mut map, &roots, &truncate, config.schedule)?;

    let stats = map.stats();
    log::debug!(
        "backward pass ({}): visited {} ops, invoked {}, skipped {}; {} values hold gradients",
        config.schedule,
        stats.visited,
        stats.invoked,
        stats.skipped,
        map.len()
    );

    Ok(map)
}

/// Gradient of `cost` with respect to `wrt`, seeding `cost` with one.
///
/// Values the backward pass never reached yield `None`, including values
/// that are not part of the graph at all.
pub fn grad<V, G>(view: &V, cost: ValueId, wrt: impl Into<Wrt>) -> Result<Projection<G>>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone + One,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    grad_with(view, cost, wrt, G::one())
}

/// Like [`grad`], seeding `cost` with `cost_grad` instead of one.
pub fn grad_with<V, G>(
    view: &V,
    cost: ValueId,
    wrt: impl Into<Wrt>,
    cost_grad: G,
) -> Result<Projection<G>>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    let wrt = wrt.into();
    let map = grad_sources_inputs(view, [(cost, Some(cost_grad))], &[])?;
    Ok(map.project(&wrt))
}

// ============================================================================
// Extension Trait
// ============================================================================

/// Extension trait for computing gradients from a graph.
pub trait Differentiable<G> {
    /// See [`grad_sources_inputs`].
    fn backprop<S>(&self, sources: S, truncate: &[ValueId]) -> Result<GradientMap<G>>
    where
        S: IntoIterator<Item = (ValueId, Option<G>)>;

    /// See [`grad`].
    fn grad(&self, cost: ValueId, wrt: impl Into<Wrt>) -> Result<Projection<G>>
    where
        G: One;
}

impl<O, G> Differentiable<G> for Graph<O>
where
    O: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    fn backprop<S>(&self, sources: S, truncate: &[ValueId]) -> Result<GradientMap<G>>
    where
        S: IntoIterator<Item = (ValueId, Option<G>)>,
    {
        grad_sources_inputs(self, sources, truncate)
    }

    fn grad(&self, cost: ValueId, wrt: impl Into<Wrt>) -> Result<Projection<G>>
    where
        G: One,
    {
        grad(self, cost, wrt)
    }
}
