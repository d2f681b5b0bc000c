//! Caller-dependent rewrites: variable substitution from the interpret
//! context, `lfo(...)` desugaring and unit conversion.

use crate::interpreter::context::InterpretContext;
use crate::interpreter::scope::Scope;
use crate::interpreter::table::{Order, RuleTable};
use crate::parser::ast::{Expr, Kind, Node, NodeType, Operator, Variable};
use crate::parser::error::{Result, SyntaxError};
use std::sync::Arc;

const WAVES: [&str; 4] = ["sine", "square", "triangle", "sawtooth"];

/// Unit suffixes and their factor to hertz or seconds.
const UNITS: [(&str, f64); 4] = [("hz", 1.0), ("khz", 1000.0), ("s", 1.0), ("ms", 0.001)];

pub fn table(ctx: &InterpretContext) -> RuleTable {
    let ctx = Arc::new(ctx.clone());

    let mut table = RuleTable::new("InterpreterFunctions");
    table.register(
        NodeType::Variable,
        Order::TopDown,
        "--name and $n are replaced by their bound values",
        Arc::new(move |expr, _| substitute(expr, &ctx)),
    );
    table.register_call(
        "lfo",
        Order::BottomUp,
        "lfo(hz=1, type='sine', min=0, max=1) becomes an oscillator chain",
        Arc::new(lfo),
    );
    for (unit, factor) in UNITS {
        table.register_call(
            unit,
            Order::BottomUp,
            "unit suffix to plain number",
            Arc::new(move |expr, _| Ok(unit_value(expr, factor))),
        );
    }
    table
}

fn substitute(expr: &Expr, ctx: &InterpretContext) -> Result<Option<Node>> {
    let Kind::Variable(var) = &expr.kind else {
        return Ok(None);
    };
    // variables with arguments are calls the audio builder resolves
    if !expr.body.is_empty() {
        return Ok(None);
    }
    let Some(value) = ctx.lookup(var) else {
        return Ok(None);
    };
    if refers_to(var, value, ctx, &mut Vec::new()) {
        return Err(SyntaxError::new(format!(
            "Variable {} is defined in terms of itself.",
            var
        )));
    }
    Ok(Some(value.clone()))
}

/// True when `node`, or a value it refers to, mentions `target`.
fn refers_to(target: &Variable, node: &Node, ctx: &InterpretContext, seen: &mut Vec<Variable>) -> bool {
    match node {
        Node::Array(array) => array.iter().any(|item| refers_to(target, item, ctx, seen)),
        Node::Expr(expr) => {
            if let Kind::Variable(var) = &expr.kind {
                if var == target {
                    return true;
                }
                if !seen.contains(var) {
                    seen.push(var.clone());
                    if let Some(value) = ctx.lookup(var) {
                        if refers_to(target, value, ctx, seen) {
                            return true;
                        }
                    }
                }
            }
            expr.body.iter().any(|item| refers_to(target, item, ctx, seen))
        }
        _ => false,
    }
}

/// `lfo(hz, type, min, max)` becomes
/// `[constant(min), type(hz) > gain(diff)] > gain(1)`, where `diff` is the
/// swing between min and max (halved for sine, which swings both ways).
fn lfo(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let arg = |i: usize| expr.body.get(i).filter(|node| !node.is_undefined());

    let frequency = match arg(0) {
        None => 1.0,
        Some(Node::Number(n)) => *n,
        Some(_) => {
            return Err(SyntaxError::new(
                "First argument of lfo() must be a number for the frequency, commonly 1-5, defaults to 1.",
            ))
        }
    };
    let wave = match arg(1) {
        None => "sine".to_string(),
        Some(Node::Text(text)) => text.to_string(),
        Some(Node::Expr(e)) if e.body.is_empty() => match &e.kind {
            Kind::Call(name) => name.clone(),
            _ => String::new(),
        },
        Some(_) => String::new(),
    };
    if !WAVES.contains(&wave.as_str()) {
        return Err(SyntaxError::new(
            "Second argument of lfo() must be either 'sine', 'square', 'triangle', 'sawtooth'.",
        ));
    }
    let bound = |i: usize, default: f64| match arg(i) {
        None => Some(default),
        Some(node) => node.as_number(),
    };
    let (Some(min), Some(max)) = (bound(2, 0.0), bound(3, 1.0)) else {
        return Err(SyntaxError::new(
            "Third and forth argument of lfo() must be numbers for the max and min oscillation.",
        ));
    };

    let mut diff = max - min;
    if wave == "sine" {
        diff /= 2.0;
    }
    let oscillator = Node::binary(
        Operator::Connect,
        Node::call(wave, vec![Node::Number(frequency)]),
        Node::call("gain", vec![Node::Number(diff)]),
    );
    let mix = Node::expr(
        Kind::Mix,
        vec![Node::call("constant", vec![Node::Number(min)]), oscillator],
    );
    Ok(Some(Node::binary(
        Operator::Connect,
        mix,
        Node::call("gain", vec![Node::Number(1.0)]),
    )))
}

fn unit_value(expr: &Expr, factor: f64) -> Option<Node> {
    match expr.body.items() {
        [Node::Number(n)] => Some(Node::Number(n * factor)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::walker::interpret_node;
    use crate::parser::parse;
    use assert_approx_eq::assert_approx_eq;

    fn run_with(text: &str, ctx: &InterpretContext) -> Result<Node> {
        interpret_node(&parse(text)?, &table(ctx), Scope::root())
    }

    fn run(text: &str) -> Result<Node> {
        run_with(text, &InterpretContext::default())
    }

    #[test]
    fn test_units() {
        assert_eq!(run("440hz").unwrap(), Node::Number(440.0));
        assert_eq!(run("2kHz").unwrap(), Node::Number(2000.0));
        assert_approx_eq!(run("250ms").unwrap().as_number().unwrap(), 0.25);
        assert_eq!(run("3s").unwrap(), Node::Number(3.0));
        // unknown units are kept for the audio builder
        assert_eq!(
            run("3db").unwrap(),
            Node::call("db", vec![Node::Number(3.0)])
        );
    }

    #[test]
    fn test_variables() {
        let mut ctx = InterpretContext::default();
        ctx.set_variable("volume", Node::Number(0.5));
        ctx.arguments.push(Node::Number(440.0));

        let node = run_with("sine($1) > gain(--volume)", &ctx).unwrap();
        assert_eq!(node.to_string(), "(sine(440) > gain(0.5))");

        // unbound variables stay in place
        let node = run_with("gain(--other) > $2", &ctx).unwrap();
        assert_eq!(node.to_string(), "(gain(--other) > $2)");
    }

    #[test]
    fn test_substituted_values_are_rewritten() {
        let mut ctx = InterpretContext::default();
        ctx.set_variable("--freq", parse("2khz").unwrap());
        let node = run_with("sine(--freq)", &ctx).unwrap();
        assert_eq!(node, Node::call("sine", vec![Node::Number(2000.0)]));
    }

    #[test]
    fn test_cyclic_variables() {
        let mut ctx = InterpretContext::default();
        ctx.set_variable("a", parse("gain(--b)").unwrap());
        ctx.set_variable("b", parse("[--a]").unwrap());
        let err = run_with("--a", &ctx).unwrap_err();
        assert_eq!(err.message, "Variable --a is defined in terms of itself.");
    }

    #[test]
    fn test_lfo_defaults() {
        let node = run("lfo()").unwrap();
        assert_eq!(
            node.to_string(),
            "([](constant(0), (sine(1) > gain(0.5))) > gain(1))"
        );
    }

    #[test]
    fn test_lfo_arguments() {
        let node = run("lfo(4, 'square', 200, 400)").unwrap();
        assert_eq!(
            node.to_string(),
            "([](constant(200), (square(4) > gain(200))) > gain(1))"
        );
        let node = run("lfo(, sawtooth)").unwrap();
        assert!(node.to_string().contains("sawtooth(1)"));
    }

    #[test]
    fn test_lfo_errors() {
        assert!(run("lfo('a')")
            .unwrap_err()
            .message
            .starts_with("First argument of lfo()"));
        assert!(run("lfo(1, 'noise')")
            .unwrap_err()
            .message
            .starts_with("Second argument of lfo()"));
        assert!(run("lfo(1, 'sine', 'low')")
            .unwrap_err()
            .message
            .starts_with("Third and forth argument of lfo()"));
    }
}
