//! `random(...)` calls, drawn from a seedable generator so that a given
//! seed always produces the same tree.

use crate::interpreter::scope::Scope;
use crate::interpreter::table::{Order, RuleTable};
use crate::parser::ast::{Expr, Node};
use crate::parser::error::{Result, SyntaxError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};

pub fn table(seed: Option<u64>) -> RuleTable {
    let rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let rng = Arc::new(Mutex::new(rng));

    let mut table = RuleTable::new("Random");
    table.register_call(
        "random",
        Order::BottomUp,
        "random(), random(max), random(min, max), random(min, max, step) or random([choices])",
        Arc::new(move |expr, scope| {
            // A poisoned lock only means another walk panicked mid-draw
            let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            random(expr, scope, &mut *rng)
        }),
    );
    table
}

fn random(expr: &Expr, _: Scope<'_>, rng: &mut impl Rng) -> Result<Option<Node>> {
    let arg = |i: usize| expr.body.get(i).unwrap_or(&Node::Undefined);
    if expr.body.len() > 3 {
        return Err(illegal_parameters(expr));
    }
    let (a, b, step) = (arg(0), arg(1), arg(2));

    if let Node::Array(choices) = a {
        if choices.is_empty() {
            return Ok(Some(Node::Undefined));
        }
        return Ok(Some(choices.items()[rng.gen_range(0..choices.len())].clone()));
    }

    let r: f64 = rng.gen();
    let value = match (a, b, step) {
        (Node::Undefined, Node::Undefined, Node::Undefined) => r,
        (Node::Number(a), Node::Undefined, Node::Undefined) => r * a,
        (Node::Number(a), Node::Number(b), Node::Undefined) => r * (b - a) + a,
        (_, _, Node::Number(step)) if *step < 0.0 => {
            return Err(SyntaxError::new(format!(
                "Random function broken, illegal parameter: step must be a positive number: {}",
                step
            )))
        }
        (Node::Number(a), Node::Number(b), Node::Number(step)) => {
            (r * (b - a) / step).round() * step + a
        }
        (Node::Undefined, Node::Number(b), Node::Number(step)) => (r * b / step).round() * step,
        _ => return Err(illegal_parameters(expr)),
    };
    Ok(Some(Node::Number(value)))
}

fn illegal_parameters(expr: &Expr) -> SyntaxError {
    SyntaxError::new(format!(
        "Random function broken, illegal parameters: {}",
        expr
    ))
}
