use crate::parser::ast::{Node, Variable};
use std::collections::HashMap;

/// What a full interpretation takes from its caller.
#[derive(Debug, Clone, Default)]
pub struct InterpretContext {
    /// `--name` bindings, keyed with the leading dashes
    pub variables: HashMap<String, Node>,
    /// `$1`, `$2`, ...
    pub arguments: Vec<Node>,
    /// Fixed seed for `random(...)`; fresh entropy when `None`
    pub seed: Option<u64>,
}

impl InterpretContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bind `--name`. The dashes are optional.
    pub fn set_variable(&mut self, name: &str, value: Node) {
        self.variables.insert(css_name(name), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Node> {
        self.variables.get(&css_name(name))
    }

    pub fn lookup(&self, var: &Variable) -> Option<&Node> {
        match var {
            Variable::Css(name) => self.variable(name),
            Variable::Positional(0) => None,
            Variable::Positional(index) => self.arguments.get(index - 1),
        }
    }
}

fn css_name(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        format!("--{}", name)
    }
}
