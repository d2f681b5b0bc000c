//! List flattening: `:` concatenates, `|` chains collapse into one node.

use crate::interpreter::scope::Scope;
use crate::interpreter::table::{Order, RuleTable};
use crate::parser::ast::{Array, Expr, Kind, Node, NodeType, Operator};
use crate::parser::error::Result;
use std::sync::Arc;

pub fn table() -> RuleTable {
    let mut table = RuleTable::new("ListOps");
    table.register(
        NodeType::Operator(Operator::Concat),
        Order::BottomUp,
        "a:b concatenates values and arrays into one flat array",
        Arc::new(concat),
    );
    table.register(
        NodeType::Operator(Operator::Pipe),
        Order::BottomUp,
        "a|b|c flattens into a single pipe node without holes",
        Arc::new(pipe),
    );
    table
}

fn concat(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let mut items = Vec::new();
    for (i, operand) in expr.body.iter().enumerate() {
        match operand {
            Node::Array(array) => items.extend_from_slice(array.items()),
            // prefix form `:x` has no left side
            Node::Undefined if i == 0 => {}
            other => items.push(other.clone()),
        }
    }
    Ok(Some(Node::Array(Array::new(items))))
}

fn pipe(expr: &Expr, _: Scope<'_>) -> Result<Option<Node>> {
    let nested = |node: &Node| matches!(node.kind(), Some(Kind::Operator(Operator::Pipe)));
    if !expr
        .body
        .iter()
        .any(|node| node.is_undefined() || nested(node))
    {
        return Ok(None);
    }
    let mut items = Vec::new();
    for operand in expr.body.iter() {
        match operand.as_expr() {
            Some(inner) if nested(operand) => items.extend_from_slice(inner.body.items()),
            _ if operand.is_undefined() => {}
            _ => items.push(operand.clone()),
        }
    }
    Ok(Some(Node::expr(Kind::Operator(Operator::Pipe), items)))
}
