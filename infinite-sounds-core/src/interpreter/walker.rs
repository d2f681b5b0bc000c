//! Generic tree rewriting. One call applies one [`RuleTable`] to a whole
//! tree, depth first and left to right.
//!
//! For every expression node:
//! 1. a top-down rule runs first; if it replaces the node, the replacement
//!    is rewritten again from scratch with the same scope,
//! 2. otherwise the body is rewritten, but only when it is dirty,
//! 3. then a bottom-up rule runs on the (possibly rebuilt) node.
//!
//! Nodes and arrays that nothing changed are handed back as the same
//! shared allocation. Parenthesized groups never produce a wrapper node
//! in this tree, so there is nothing to unwrap after recursion.

use crate::interpreter::scope::{Frame, Scope};
use crate::interpreter::table::RuleTable;
use crate::parser::ast::{Array, Expr, Node};
use crate::parser::error::Result;
use std::sync::Arc;
use tracing::trace;

/// Rewrite `node` with every rule of `table`.
pub fn interpret_node(node: &Node, table: &RuleTable, scope: Scope<'_>) -> Result<Node> {
    Ok(visit(node, table, scope)?.unwrap_or_else(|| node.clone()))
}

fn visit(node: &Node, table: &RuleTable, scope: Scope<'_>) -> Result<Option<Node>> {
    match node {
        Node::Array(array) if array.is_dirty() => {
            Ok(visit_array(array, table, scope)?.map(Node::Array))
        }
        Node::Expr(expr) => visit_expr(expr, table, scope),
        _ => Ok(None),
    }
}

fn visit_expr(expr: &Arc<Expr>, table: &RuleTable, scope: Scope<'_>) -> Result<Option<Node>> {
    let rule = table.rule_for(&expr.kind);

    if let Some(rule) = rule.filter(|rule| rule.order.is_top_down()) {
        if let Some(replacement) = rule.apply(expr, scope)? {
            trace!(table = table.name(), rule = %rule.name, "top-down rewrite");
            return Ok(Some(interpret_node(&replacement, table, scope)?));
        }
    }

    let mut current = Arc::clone(expr);
    if expr.body.is_dirty() {
        let frame = Frame {
            expr: expr.as_ref(),
            parent: scope,
        };
        if let Some(body) = visit_array(&expr.body, table, Scope::new(&frame))? {
            current = Arc::new(Expr {
                kind: expr.kind.clone(),
                body,
            });
        }
    }

    if let Some(rule) = rule.filter(|rule| rule.order.is_bottom_up()) {
        if let Some(replacement) = rule.apply(&current, scope)? {
            trace!(table = table.name(), rule = %rule.name, "bottom-up rewrite");
            return Ok(Some(replacement));
        }
    }

    if Arc::ptr_eq(&current, expr) {
        Ok(None)
    } else {
        Ok(Some(Node::Expr(current)))
    }
}

/// Rewrite every element; a new array is only built if one changed.
fn visit_array(array: &Array, table: &RuleTable, scope: Scope<'_>) -> Result<Option<Array>> {
    let mut changed: Option<Vec<Node>> = None;
    for (i, item) in array.iter().enumerate() {
        match (visit(item, table, scope)?, changed.as_mut()) {
            (Some(node), Some(items)) => items.push(node),
            (Some(node), None) => {
                let mut items = Vec::with_capacity(array.len());
                items.extend_from_slice(&array.items()[..i]);
                items.push(node);
                changed = Some(items);
            }
            (None, Some(items)) => items.push(item.clone()),
            (None, None) => {}
        }
    }
    Ok(changed.map(Array::new))
}
