//! Common test utilities for gradient traversal tests

#![allow(dead_code)]

use std::cell::Cell;
use std::fmt;
use std::ops::Add;
use std::rc::Rc;

use symgrad::prelude::*;

pub type Rule = Box<dyn GradientRule<f64>>;

pub type RuleResult<G> = std::result::Result<LocalGrad<G>, RuleError>;

pub const SCHEDULES: [Schedule; 2] = [Schedule::Pending, Schedule::Topological];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Boxes a closure as a gradient rule over `f64`.
pub fn rule<F>(name: &str, f: F) -> Rule
where
    F: Fn(&[ValueId], &[Option<f64>]) -> RuleResult<f64> + 'static,
{
    Box::new(RuleFn::new(name, f))
}

/// Boxes a closure as a gradient rule over any gradient type.
pub fn rule_for<G, F>(name: &str, f: F) -> Box<dyn GradientRule<G>>
where
    G: 'static,
    F: Fn(&[ValueId], &[Option<G>]) -> RuleResult<G> + 'static,
{
    Box::new(RuleFn::new(name, f))
}

/// Counts how many times the rules sharing it were called.
#[derive(Debug, Clone, Default)]
pub struct Calls(Rc<Cell<usize>>);

impl Calls {
    pub fn get(&self) -> usize {
        self.0.get()
    }

    pub fn hit(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Like [`rule`], counting calls in `calls`.
pub fn counted<F>(name: &str, calls: &Calls, f: F) -> Rule
where
    F: Fn(&[ValueId], &[Option<f64>]) -> RuleResult<f64> + 'static,
{
    let calls = calls.clone();
    rule(name, move |inputs, grads| {
        calls.hit();
        f(inputs, grads)
    })
}

/// A rule returning `result` no matter what it is given.
pub fn constant(name: &str, result: LocalGrad<f64>) -> Rule {
    rule(name, move |_, _| Ok(result.clone()))
}

/// `[g0, g0 + g1]` when the second output has a gradient, `[g0, g0]` otherwise.
pub fn fold_second(_: &[ValueId], grads: &[Option<f64>]) -> RuleResult<f64> {
    let g0 = grads[0];
    let second = match (g0, grads[1]) {
        (Some(g0), Some(g1)) => Some(g0 + g1),
        _ => g0,
    };
    Ok(LocalGrad::Many(vec![g0, second]))
}

/// A symbolic gradient expression.
///
/// Adding two expressions builds a new node, so tests can see exactly which
/// contributions were combined and in what shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Sym {
    Var(&'static str),
    Sum(Box<Sym>, Box<Sym>),
    Scale(f64, Box<Sym>),
}

impl Sym {
    pub fn var(name: &'static str) -> Self {
        Sym::Var(name)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Sym::Scale(factor, Box::new(self.clone()))
    }

    /// Number of `+` nodes in the expression.
    pub fn additions(&self) -> usize {
        match self {
            Sym::Var(_) => 0,
            Sym::Sum(lhs, rhs) => 1 + lhs.additions() + rhs.additions(),
            Sym::Scale(_, inner) => inner.additions(),
        }
    }
}

impl<'a> Add<&'a Sym> for &'a Sym {
    type Output = Sym;

    fn add(self, rhs: &'a Sym) -> Sym {
        Sym::Sum(Box::new(self.clone()), Box::new(rhs.clone()))
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sym::Var(name) => write!(f, "{}", name),
            Sym::Sum(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Sym::Scale(factor, inner) => write!(f, "{} * {}", factor, inner),
        }
    }
}
