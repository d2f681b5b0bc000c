use crate::parser::ast::Expr;
use std::iter;

/// The chain of expressions enclosing the node a rule is looking at,
/// innermost first. Frames live on the walker's stack and are rebuilt for
/// every descent, so a scope never outlives the walk that created it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    frame: Option<&'a Frame<'a>>,
}

#[derive(Debug)]
pub struct Frame<'a> {
    pub expr: &'a Expr,
    pub parent: Scope<'a>,
}

impl<'a> Scope<'a> {
    /// An empty scope, for the root of a tree.
    pub fn root() -> Self {
        Scope { frame: None }
    }

    pub fn new(frame: &'a Frame<'a>) -> Self {
        Scope { frame: Some(frame) }
    }

    /// The directly enclosing expression.
    pub fn parent(&self) -> Option<&'a Expr> {
        self.frame.map(|frame| frame.expr)
    }

    /// Enclosing expressions, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Expr> + 'a {
        iter::successors(self.frame, |frame| frame.parent.frame).map(|frame| frame.expr)
    }

    pub fn is_root(&self) -> bool {
        self.frame.is_none()
    }
}
