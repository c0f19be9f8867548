//! Backward traversal utilities
//!
//! Everything here walks from values toward the operators that produced
//! them, i.e. against the forward data flow.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{GraphView, OpId, ValueId};

/// Collect the operators reachable backward from `roots`.
///
/// A value in `stop` is treated as a leaf: its owner is not entered through
/// it. The result is in breadth-first discovery order, which only depends on
/// the order of `roots` and of each operator's inputs.
pub fn reachable_ops<V>(view: &V, roots: &[ValueId], stop: &FxHashSet<ValueId>) -> Vec<OpId>
where
    V: GraphView + ?Sized,
{
    let mut result = Vec::new();
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::new();

    for &root in roots {
        if let Some(op) = upstream_owner(view, root, stop)
            && visited.insert(op)
        {
            queue.push_back(op);
        }
    }

    while let Some(op) = queue.pop_front() {
        result.push(op);
        for &input in view.inputs(op) {
            if let Some(owner) = upstream_owner(view, input, stop)
                && visited.insert(owner)
            {
                queue.push_back(owner);
            }
        }
    }

    result
}

fn upstream_owner<V>(view: &V, value: ValueId, stop: &FxHashSet<ValueId>) -> Option<OpId>
where
    V: GraphView + ?Sized,
{
    if stop.contains(&value) {
        None
    } else {
        view.owner(value)
    }
}

/// Distinct operators in `members` that produced one of `op`'s inputs.
///
/// Returned in input order. Edges are followed regardless of any stop set:
/// this is the dependency relation, not the reachability relation.
pub fn producers<V>(view: &V, op: OpId, members: &FxHashSet<OpId>) -> Vec<OpId>
where
    V: GraphView + ?Sized,
{
    let mut result = Vec::new();
    for &input in view.inputs(op) {
        if let Some(owner) = view.owner(input)
            && members.contains(&owner)
            && !result.contains(&owner)
        {
            result.push(owner);
        }
    }
    result
}

/// For every operator in `ops`, count the distinct operators of `ops` reading
/// one of its outputs.
pub fn fan_out<V>(view: &V, ops: &[OpId], members: &FxHashSet<OpId>) -> FxHashMap<OpId, usize>
where
    V: GraphView + ?Sized,
{
    let mut counts: FxHashMap<OpId, usize> = ops.iter().map(|&op| (op, 0)).collect();
    for &op in ops {
        for producer in producers(view, op, members) {
            *counts.entry(producer).or_insert(0) += 1;
        }
    }
    counts
}

/// Depth-first post-order of `ops` (producers before consumers).
///
/// Iterative, so long operator chains do not exhaust the call stack.
pub fn post_order<V>(view: &V, ops: &[OpId], members: &FxHashSet<OpId>) -> Vec<OpId>
where
    V: GraphView + ?Sized,
{
    let mut result = Vec::with_capacity(ops.len());
    let mut visited = FxHashSet::default();
    let mut stack: Vec<(OpId, bool)> = Vec::new();

    for &root in ops {
        if visited.contains(&root) {
            continue;
        }
        stack.push((root, false));

        while let Some((op, expanded)) = stack.pop() {
            if expanded {
                result.push(op);
                continue;
            }
            if !visited.insert(op) {
                continue;
            }
            stack.push((op, true));
            for producer in producers(view, op, members).into_iter().rev() {
                if !visited.contains(&producer) {
                    stack.push((producer, false));
                }
            }
        }
    }

    result
}
