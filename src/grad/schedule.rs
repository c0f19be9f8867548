//! Backward scheduling
//!
//! Visits every operator reachable from the seeded values exactly once, after
//! every contribution to its outputs has been accumulated.

use std::ops::Add;

use rustc_hash::FxHashSet;
use symgrad_graph::traversal::{fan_out, post_order, producers, reachable_ops};
use symgrad_graph::{GraphView, OpId, ValueId};

use super::context::GradientMap;
use super::rules::{GradientRule, invoke_rule};
use crate::config::Schedule;
use crate::error::Result;

/// Propagate the gradients already in `map` back from `roots`.
///
/// Values in `truncate` are not traversed through; contributions to them are
/// still recorded.
pub(crate) fn run<V, G>(
    view: &V,
    map: &mut GradientMap<G>,
    roots: &[ValueId],
    truncate: &FxHashSet<ValueId>,
    schedule: Schedule,
) -> Result<()>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    let ops = reachable_ops(view, roots, truncate);
    let members: FxHashSet<OpId> = ops.iter().copied().collect();
    log::trace!("{} operators reachable from {} roots", ops.len(), roots.len());

    match schedule {
        Schedule::Pending => run_pending(view, map, &ops, &members),
        Schedule::Topological => run_topological(view, map, &ops, &members),
    }
}

fn run_pending<V, G>(
    view: &V,
    map: &mut GradientMap<G>,
    ops: &[OpId],
    members: &FxHashSet<OpId>,
) -> Result<()>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    let mut pending = fan_out(view, ops, members);
    let mut worklist: Vec<OpId> = ops
        .iter()
        .rev()
        .copied()
        .filter(|op| pending.get(op) == Some(&0))
        .collect();

    while let Some(op) = worklist.pop() {
        visit(view, map, op)?;

        for producer in producers(view, op, members) {
            if let Some(count) = pending.get_mut(&producer) {
                *count -= 1;
                if *count == 0 {
                    worklist.push(producer);
                }
            }
        }
    }

    Ok(())
}

fn run_topological<V, G>(
    view: &V,
    map: &mut GradientMap<G>,
    ops: &[OpId],
    members: &FxHashSet<OpId>,
) -> Result<()>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    for op in post_order(view, ops, members).into_iter().rev() {
        visit(view, map, op)?;
    }
    Ok(())
}

/// Call the rule of `op` and accumulate what it returns into its inputs.
fn visit<V, G>(view: &V, map: &mut GradientMap<G>, op: OpId) -> Result<()>
where
    V: GraphView + ?Sized,
    V::Op: GradientRule<G>,
    G: Clone,
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    map.stats_mut().visited += 1;

    let output_grads: Vec<Option<G>> = view
        .outputs(op)
        .iter()
        .map(|&value| map.get(value).cloned())
        .collect();
    let present = output_grads.iter().filter(|g| g.is_some()).count();

    if present == 0 {
        map.stats_mut().skipped += 1;
        log::trace!("skipping {}: no output gradients", op);
        return Ok(());
    }

    let Some(rule) = view.payload(op) else {
        map.stats_mut().skipped += 1;
        log::warn!("{} has no gradient rule attached; skipping", op);
        return Ok(());
    };

    log::debug!(
        "invoking `{}` ({}) with {}/{} output gradients",
        GradientRule::<G>::name(rule),
        op,
        present,
        output_grads.len()
    );
    map.stats_mut().invoked += 1;

    let inputs = view.inputs(op);
    let input_grads = invoke_rule(op, rule, inputs, &output_grads)?;
    for (&input, grad) in inputs.iter().zip(input_grads) {
        if let Some(grad) = grad {
            log::trace!("{} contributes to {}", op, input);
            map.add_contribution(input, grad);
        }
    }

    Ok(())
}
