//! Audio graph sugar around `>`.

use crate::interpreter::scope::Scope;
use crate::interpreter::table::{Order, RuleTable};
use crate::parser::ast::{Expr, Kind, Node, NodeType, Operator};
use crate::parser::error::Result;
use std::sync::Arc;

pub fn table() -> RuleTable {
    let mut table = RuleTable::new("AudioPiping");
    table.register(
        NodeType::Operator(Operator::Connect),
        Order::BottomUp,
        "a > b > c becomes one chain; arrays mix, a leading number is a constant",
        Arc::new(connect),
    );
    table
}

fn is_connect(node: &Node) -> bool {
    matches!(node.kind(), Some(Kind::Operator(Operator::Connect)))
}

fn connect(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let mut chain = Vec::with_capacity(expr.body.len());
    for operand in expr.body.iter() {
        match operand {
            Node::Undefined => {}
            Node::Expr(inner) if is_connect(operand) => {
                chain.extend(inner.body.iter().filter(|n| !n.is_undefined()).cloned())
            }
            other => chain.push(other.clone()),
        }
    }

    let mut changed = chain.len() != expr.body.len();
    for (i, node) in chain.iter_mut().enumerate() {
        let replacement = match node {
            Node::Number(n) if i == 0 => Node::call("constant", vec![Node::Number(*n)]),
            Node::Array(array) => mix(array.iter()),
            _ => continue,
        };
        *node = replacement;
        changed = true;
    }

    if !changed {
        return Ok(None);
    }
    Ok(Some(Node::expr(Kind::Operator(Operator::Connect), chain)))
}

/// `[a, [b, c]]` becomes `[](a, [](b, c))`; holes are dropped.
fn mix<'a>(items: impl Iterator<Item = &'a Node>) -> Node {
    let body = items
        .filter(|item| !item.is_undefined())
        .map(|item| match item {
            Node::Array(inner) => mix(inner.iter()),
            other => other.clone(),
        })
        .collect();
    Node::expr(Kind::Mix, body)
}
