//! Gradients as symbolic expressions
//!
//! With a gradient type that builds a new node for every `+`, these tests
//! check how contributions are combined, not just their numeric result.

mod common;

use common::*;
use rstest::rstest;
use symgrad::prelude::*;
use symgrad::grad_sources_inputs_with;

type SymRule = Box<dyn GradientRule<Sym>>;

fn sym_rule<F>(name: &str, f: F) -> SymRule
where
    F: Fn(&[ValueId], &[Option<Sym>]) -> RuleResult<Sym> + 'static,
{
    rule_for::<Sym, F>(name, f)
}

/// Scales the single output gradient by `factor`.
fn scale(factor: f64) -> SymRule {
    sym_rule("scale", move |_, grads| {
        Ok(LocalGrad::Many(vec![grads[0].as_ref().map(|g| g.scale(factor))]))
    })
}

#[test]
fn test_single_contribution_is_stored_verbatim() {
    init_logger();
    let mut graph: Graph<SymRule> = Graph::new();
    let x = graph.input("x");
    let op = graph.op(scale(2.0)).input(x).build().unwrap();
    let y = graph.outputs(op)[0];

    let grads = graph.backprop([(y, Some(Sym::var("gy")))], &[]).unwrap();
    assert_eq!(grads.get(y), Some(&Sym::var("gy")));
    assert_eq!(grads.get(x), Some(&Sym::var("gy").scale(2.0)));
    assert_eq!(grads.get(x).map(Sym::additions), Some(0));
}

#[test]
fn test_contributions_are_added_in_input_order() {
    init_logger();
    // z = g(y, y) where y = f(x)
    let mut graph: Graph<SymRule> = Graph::new();
    let x = graph.input("x");
    let f = graph.op(scale(1.0)).input(x).build().unwrap();
    let y = graph.outputs(f)[0];
    let g = graph
        .op(sym_rule("g", |_, grads| {
            let gz = grads[0].as_ref();
            Ok(LocalGrad::Many(vec![
                gz.map(|g| g.scale(2.0)),
                gz.map(|g| g.scale(3.0)),
            ]))
        }))
        .inputs([y, y])
        .build()
        .unwrap();
    let z = graph.outputs(g)[0];

    let grads = graph.backprop([(z, Some(Sym::var("gz")))], &[]).unwrap();
    let gy = grads.get(y).unwrap();
    assert_eq!(gy.to_string(), "(2 * gz + 3 * gz)");
    assert_eq!(gy.additions(), 1);
    assert_eq!(grads.get(x), Some(&gy.scale(1.0)));
}

#[test]
fn test_rule_results_are_returned_as_is() {
    init_logger();
    let mut graph: Graph<SymRule> = Graph::new();
    let x0 = graph.input("x0");
    let x1 = graph.input("x1");
    let op = graph
        .op(sym_rule("pair", |_, _| {
            Ok(LocalGrad::Many(vec![
                Some(Sym::var("gval0")),
                Some(Sym::var("gval1")),
            ]))
        }))
        .inputs([x0, x1])
        .outputs(2)
        .build()
        .unwrap();
    let (out0, out1) = (graph.outputs(op)[0], graph.outputs(op)[1]);

    let grads = grad_with(&graph, out0, [x0, x1, out1], Sym::var("one")).unwrap();
    assert_eq!(
        grads.into_vec(),
        vec![Some(Sym::var("gval0")), Some(Sym::var("gval1")), None]
    );
}

#[rstest]
fn test_diamond_accumulates_once_per_path(
    #[values(Schedule::Pending, Schedule::Topological)] schedule: Schedule,
) {
    init_logger();
    // x -> A -> (a0, a1); a0 -> B; a1 -> C; (b0, c0) -> D
    let calls = Calls::default();
    let counter = calls.clone();
    let mut graph: Graph<SymRule> = Graph::new();
    let x = graph.input("x");
    let a = graph
        .op(sym_rule("A", move |_, grads| {
            counter.hit();
            let sum = match (&grads[0], &grads[1]) {
                (Some(g0), Some(g1)) => Some(g0 + g1),
                (g0, g1) => g0.clone().or_else(|| g1.clone()),
            };
            Ok(LocalGrad::Many(vec![sum]))
        }))
        .input(x)
        .outputs(2)
        .build()
        .unwrap();
    let (a0, a1) = (graph.outputs(a)[0], graph.outputs(a)[1]);
    let b = graph.op(scale(2.0)).input(a0).build().unwrap();
    let c = graph.op(scale(3.0)).input(a1).build().unwrap();
    let (b0, c0) = (graph.outputs(b)[0], graph.outputs(c)[0]);
    let d = graph
        .op(sym_rule("D", |_, grads| {
            Ok(LocalGrad::Many(vec![grads[0].clone(), grads[0].clone()]))
        }))
        .inputs([b0, c0])
        .build()
        .unwrap();
    let out = graph.outputs(d)[0];

    let config = GradConfig::new().with_schedule(schedule);
    let grads =
        grad_sources_inputs_with(&graph, [(out, Some(Sym::var("g")))], &[], &config).unwrap();

    assert_eq!(calls.get(), 1);
    let gx = grads.get(x).unwrap();
    assert_eq!(gx.to_string(), "(2 * g + 3 * g)");
    assert_eq!(grads.stats().invoked, 4);
    assert_eq!(grads.stats().contributions, 6);
}
