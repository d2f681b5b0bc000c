//! Numeric simplification in two passes.
//!
//! `MathOps1` folds operators whose operands are both numbers. `MathOps2`
//! removes neutral operands (`x*1`, `x+0`, ...) and broadcasts operators
//! over arrays element by element. Notes are never touched here; their
//! arithmetic belongs to the music pass.

use crate::interpreter::scope::Scope;
use crate::interpreter::table::{Order, RuleTable};
use crate::parser::ast::{Array, Expr, Node, NodeType, Operator};
use crate::parser::error::Result;
use std::sync::Arc;

const FOLDED: [Operator; 9] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Mod,
    Operator::Pow,
    Operator::Octave,
    Operator::StepUp,
    Operator::StepDown,
];

const BROADCAST: [Operator; 10] = [
    Operator::Add,
    Operator::Sub,
    Operator::Mul,
    Operator::Div,
    Operator::Mod,
    Operator::Pow,
    Operator::Octave,
    Operator::StepUp,
    Operator::StepDown,
    Operator::Seven,
];

/// Apply a numeric operator. The `^^`, `^+` and `^-` forms read the right
/// side as octaves and semitones of a frequency.
pub fn fold_numbers(op: Operator, a: f64, b: f64) -> Option<f64> {
    Some(match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => a / b,
        Operator::Mod => a % b,
        Operator::Pow => a.powf(b),
        Operator::Octave => a * 2f64.powf(b),
        Operator::StepUp => a * 2f64.powf(b / 12.0),
        Operator::StepDown => a * 2f64.powf(-b / 12.0),
        _ => return None,
    })
}

pub fn math1() -> RuleTable {
    let mut table = RuleTable::new("MathOps1");
    for op in FOLDED {
        table.register(
            NodeType::Operator(op),
            Order::BottomUp,
            "folds two numbers",
            Arc::new(move |expr, _| Ok(fold(op, expr))),
        );
    }
    table
}

fn fold(op: Operator, expr: &Expr) -> Option<Node> {
    match expr.operands()? {
        (Node::Number(a), Node::Number(b)) => fold_numbers(op, *a, *b).map(Node::Number),
        // prefix minus
        (Node::Undefined, Node::Number(b)) if op == Operator::Sub => Some(Node::Number(-b)),
        _ => None,
    }
}

pub fn math2() -> RuleTable {
    let mut table = RuleTable::new("MathOps2");
    for op in BROADCAST {
        table.register(
            NodeType::Operator(op),
            Order::Both,
            "drops neutral operands and broadcasts over arrays",
            Arc::new(move |expr, scope| simplify(op, expr, scope)),
        );
    }
    table
}

fn simplify(op: Operator, expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let Some((left, right)) = expr.operands() else {
        return Ok(None);
    };
    if let Some(node) = identity(op, left, right) {
        return Ok(Some(node));
    }
    Ok(broadcast(op, left, right))
}

/// `x*1 1*x x/1 x+0 0+x x-0 x^^0 x^+0 x^-0` all reduce to `x`, unless
/// `x` is a note.
fn identity(op: Operator, left: &Node, right: &Node) -> Option<Node> {
    let is = |node: &Node, value: f64| node.as_number() == Some(value);
    let keep = |node: &Node| {
        if node.is_note() || node.is_undefined() {
            None
        } else {
            Some(node.clone())
        }
    };
    match op {
        Operator::Mul if is(right, 1.0) => keep(left),
        Operator::Mul if is(left, 1.0) => keep(right),
        Operator::Div if is(right, 1.0) => keep(left),
        Operator::Add if is(right, 0.0) => keep(left),
        Operator::Add if is(left, 0.0) => keep(right),
        Operator::Sub | Operator::Octave | Operator::StepUp | Operator::StepDown
            if is(right, 0.0) =>
        {
            keep(left)
        }
        _ => None,
    }
}

/// `[a,b] op x` becomes `[a op x, b op x]`, `x op [a,b]` likewise, and two
/// arrays of equal length are combined pairwise. Holes stay holes.
fn broadcast(op: Operator, left: &Node, right: &Node) -> Option<Node> {
    let items: Vec<Node> = match (left, right) {
        (Node::Undefined, _) | (_, Node::Undefined) => return None,
        (Node::Array(a), Node::Array(b)) if a.len() == b.len() => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| apply(op, x, y))
            .collect(),
        (Node::Array(_), Node::Array(_)) => return None,
        (Node::Array(a), y) => a.iter().map(|x| apply(op, x, y)).collect(),
        (x, Node::Array(b)) => b.iter().map(|y| apply(op, x, y)).collect(),
        _ => return None,
    };
    Some(Node::Array(Array::new(items)))
}

fn apply(op: Operator, left: &Node, right: &Node) -> Node {
    match (left, right) {
        (Node::Undefined, _) | (_, Node::Undefined) => Node::Undefined,
        (Node::Number(a), Node::Number(b)) => fold_numbers(op, *a, *b)
            .map(Node::Number)
            .unwrap_or_else(|| Node::binary(op, left.clone(), right.clone())),
        _ => Node::binary(op, left.clone(), right.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::walker::interpret_node;
    use crate::parser::ast::Kind;
    use crate::parser::parse;
    use assert_approx_eq::assert_approx_eq;

    fn run(text: &str) -> Node {
        let tree = parse(text).unwrap();
        let tree = interpret_node(&tree, &math1(), Scope::root()).unwrap();
        interpret_node(&tree, &math2(), Scope::root()).unwrap()
    }

    fn number(node: &Node) -> f64 {
        node.as_number()
            .unwrap_or_else(|| panic!("expected number, got {}", node))
    }

    #[test]
    fn test_folding() {
        assert_eq!(run("1+2*3"), Node::Number(7.0));
        assert_eq!(run("(1+2)*3"), Node::Number(9.0));
        assert_eq!(run("7%4"), Node::Number(3.0));
        assert_eq!(run("2^10"), Node::Number(1024.0));
        assert_eq!(run("8-2-1"), Node::Number(5.0));
        assert_eq!(run("-(2)"), Node::Number(-2.0));
    }

    #[test]
    fn test_frequency_steps() {
        assert_approx_eq!(number(&run("440^^1")), 880.0);
        assert_approx_eq!(number(&run("440^+12")), 880.0);
        assert_approx_eq!(number(&run("440^-12")), 220.0);
        assert_approx_eq!(number(&run("440^+1")), 466.1637615180899, 1e-9);
    }

    #[test]
    fn test_identities() {
        assert_eq!(run("sine*1"), Node::call("sine", vec![]));
        assert_eq!(run("1*sine"), Node::call("sine", vec![]));
        assert_eq!(run("sine+0"), Node::call("sine", vec![]));
        assert_eq!(run("sine^^0"), Node::call("sine", vec![]));
    }

    #[test]
    fn test_identities_skip_notes() {
        let node = run("C4+0");
        assert_eq!(node.kind(), Some(&Kind::Operator(Operator::Add)));
    }

    #[test]
    fn test_dirty_array_is_reduced() {
        let node = run("[1+1,2]");
        assert_eq!(
            node,
            Node::Array(Array::new(vec![Node::Number(2.0), Node::Number(2.0)]))
        );
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(
            run("[1,2,,3]*2"),
            Node::Array(Array::new(vec![
                Node::Number(2.0),
                Node::Number(4.0),
                Node::Undefined,
                Node::Number(6.0),
            ]))
        );
        assert_eq!(
            run("[1,2]+[10,20]"),
            Node::Array(Array::new(vec![Node::Number(11.0), Node::Number(22.0)]))
        );
        // mismatched lengths are left alone
        assert_eq!(
            run("[1,2]+[10]").kind(),
            Some(&Kind::Operator(Operator::Add))
        );
    }

    #[test]
    fn test_broadcast_over_notes_keeps_operators() {
        match run("[C4,E4]^^1") {
            Node::Array(array) => {
                assert_eq!(array.len(), 2);
                assert!(array
                    .iter()
                    .all(|n| n.kind() == Some(&Kind::Operator(Operator::Octave))));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_simplified_tree_is_stable() {
        let tree = run("sine(440) > gain(0.5)");
        let again = interpret_node(&tree, &math2(), Scope::root()).unwrap();
        assert!(again.is_same(&tree));
    }
}
