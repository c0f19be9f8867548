//! Gradient accumulation
//!
//! This module provides [`GradientMap`], the structure that collects gradient
//! contributions during backpropagation, and the projection types used to read
//! results back for specific values.

use std::collections::hash_map::Entry;
use std::ops::Add;

use rustc_hash::FxHashMap;
use symgrad_graph::ValueId;

// ============================================================================
// GradientMap
// ============================================================================

/// Counters describing one backward traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Operators the scheduler finished (invoked or skipped).
    pub visited: usize,
    /// Operators whose gradient rule was called.
    pub invoked: usize,
    /// Operators skipped because none of their outputs had a gradient.
    pub skipped: usize,
    /// Contributions merged into the map, seeds included.
    pub contributions: usize,
}

/// Mapping from values to their accumulated gradient.
///
/// A value is present iff at least one contribution reached it. Absence means
/// "no gradient flows here" and is never a stand-in for zero: the gradient
/// domain is not required to have a zero at all.
#[derive(Debug, Clone)]
pub struct GradientMap<G> {
    grads: FxHashMap<ValueId, G>,
    stats: TraversalStats,
}

impl<G> GradientMap<G> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            grads: FxHashMap::default(),
            stats: TraversalStats::default(),
        }
    }

    /// The accumulated gradient of `value`, if any contribution reached it.
    pub fn get(&self, value: ValueId) -> Option<&G> {
        self.grads.get(&value)
    }

    /// True if some contribution reached `value`.
    pub fn contains(&self, value: ValueId) -> bool {
        self.grads.contains_key(&value)
    }

    /// Number of values holding a gradient.
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// All `(value, gradient)` entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &G)> {
        self.grads.iter().map(|(&value, grad)| (value, grad))
    }

    /// Counters from the traversal that produced this map.
    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut TraversalStats {
        &mut self.stats
    }

    /// Look up `wrt`, yielding `None` for every value without a gradient.
    pub fn project(&self, wrt: &Wrt) -> Projection<G>
    where
        G: Clone,
    {
        match wrt {
            Wrt::One(value) => Projection::One(self.get(*value).cloned()),
            Wrt::Many(values) => {
                Projection::Many(values.iter().map(|v| self.get(*v).cloned()).collect())
            }
        }
    }
}

impl<G> GradientMap<G>
where
    for<'a> &'a G: Add<&'a G, Output = G>,
{
    /// Merge `grad` into the entry for `value`.
    ///
    /// The first contribution is stored as is; later ones are combined with
    /// the domain's addition.
    pub fn add_contribution(&mut self, value: ValueId, grad: G) {
        self.stats.contributions += 1;
        match self.grads.entry(value) {
            Entry::Occupied(mut entry) => {
                let merged = entry.get() + &grad;
                entry.insert(merged);
            }
            Entry::Vacant(entry) => {
                entry.insert(grad);
            }
        }
    }
}

impl<G> Default for GradientMap<G> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Which values to read gradients for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wrt {
    One(ValueId),
    Many(Vec<ValueId>),
}

impl From<ValueId> for Wrt {
    fn from(value: ValueId) -> Self {
        Wrt::One(value)
    }
}

impl From<Vec<ValueId>> for Wrt {
    fn from(values: Vec<ValueId>) -> Self {
        Wrt::Many(values)
    }
}

impl From<&[ValueId]> for Wrt {
    fn from(values: &[ValueId]) -> Self {
        Wrt::Many(values.to_vec())
    }
}

impl<const N: usize> From<[ValueId; N]> for Wrt {
    fn from(values: [ValueId; N]) -> Self {
        Wrt::Many(values.to_vec())
    }
}

/// Gradients read back for a [`Wrt`], shaped like the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection<G> {
    One(Option<G>),
    Many(Vec<Option<G>>),
}

impl<G> Projection<G> {
    /// Number of requested slots.
    pub fn len(&self) -> usize {
        match self {
            Projection::One(_) => 1,
            Projection::Many(grads) => grads.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gradient in slot `index`; a single-value projection has only slot 0.
    pub fn get(&self, index: usize) -> Option<&G> {
        match self {
            Projection::One(grad) if index == 0 => grad.as_ref(),
            Projection::One(_) => None,
            Projection::Many(grads) => grads.get(index).and_then(Option::as_ref),
        }
    }

    /// All slots in request order.
    pub fn into_vec(self) -> Vec<Option<G>> {
        match self {
            Projection::One(grad) => vec![grad],
            Projection::Many(grads) => grads,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_contribution_is_stored_verbatim() {
        let mut map = GradientMap::new();
        let x = ValueId::from(0);
        map.add_contribution(x, 2.5);
        assert_eq!(map.get(x), Some(&2.5));
        assert_eq!(map.stats().contributions, 1);
    }

    #[test]
    fn test_contributions_accumulate() {
        let mut map = GradientMap::new();
        let x = ValueId::from(0);
        map.add_contribution(x, 3.0);
        map.add_contribution(x, 3.0);

        let mut once = GradientMap::new();
        once.add_contribution(x, 6.0);

        assert_eq!(map.get(x), once.get(x));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_absent_is_not_zero() {
        let map: GradientMap<f64> = GradientMap::new();
        assert!(map.is_empty());
        assert!(!map.contains(ValueId::from(0)));
        assert_eq!(map.get(ValueId::from(0)), None);
    }

    #[test]
    fn test_project_aligns_with_request() {
        let (a, b, c) = (ValueId::from(0), ValueId::from(1), ValueId::from(2));
        let mut map = GradientMap::new();
        map.add_contribution(a, 1.0);
        map.add_contribution(c, 4.0);

        assert_eq!(map.project(&Wrt::One(a)), Projection::One(Some(1.0)));
        assert_eq!(map.project(&Wrt::One(b)), Projection::One(None));
        assert_eq!(
            map.project(&Wrt::from([a, b, c])),
            Projection::Many(vec![Some(1.0), None, Some(4.0)])
        );
    }

    #[test]
    fn test_projection_accessors() {
        let one = Projection::One(Some(1.0));
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(0), Some(&1.0));
        assert_eq!(one.get(1), None);
        assert_eq!(one.into_vec(), vec![Some(1.0)]);

        let many = Projection::Many(vec![None, Some(2.0)]);
        assert_eq!(many.len(), 2);
        assert_eq!(many.get(0), None);
        assert_eq!(many.get(1), Some(&2.0));
        assert_eq!(many.get(2), None);
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut map = GradientMap::new();
        map.add_contribution(ValueId::from(0), 1.0);
        map.add_contribution(ValueId::from(5), 2.0);
        let mut entries: Vec<_> = map.iter().map(|(v, g)| (v, *g)).collect();
        entries.sort_by_key(|(v, _)| *v);
        assert_eq!(entries, vec![(ValueId::from(0), 1.0), (ValueId::from(5), 2.0)]);
    }
}
