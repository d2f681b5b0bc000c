use crate::interpreter::scope::Scope;
use crate::parser::ast::{Expr, Kind, Node, NodeType};
use crate::parser::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// When a rule runs relative to the rewriting of its node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Before the children; a replacement is rewritten again from scratch
    TopDown,
    /// After the children
    BottomUp,
    Both,
}

impl Order {
    pub fn is_top_down(self) -> bool {
        matches!(self, Order::TopDown | Order::Both)
    }

    pub fn is_bottom_up(self) -> bool {
        matches!(self, Order::BottomUp | Order::Both)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::TopDown => write!(f, "top-down"),
            Order::BottomUp => write!(f, "bottom-up"),
            Order::Both => write!(f, "both"),
        }
    }
}

/// A rewrite function. Returns `None` when the node is left as it is.
pub type RuleHandler = Arc<dyn Fn(&Expr, Scope<'_>) -> Result<Option<Node>> + Send + Sync>;

pub struct Rule {
    pub name: String,
    pub description: String,
    pub order: Order,
    pub handler: RuleHandler,
}

impl Rule {
    pub fn apply(&self, expr: &Expr, scope: Scope<'_>) -> Result<Option<Node>> {
        (self.handler)(expr, scope)
    }
}

pub struct DocItem {
    pub name: String,
    pub order: Order,
    pub description: String,
}

/// One rewrite pass: rules keyed by node type, plus rules for word calls
/// keyed by the call's name.
pub struct RuleTable {
    name: String,
    by_type: HashMap<NodeType, Rule>,
    by_name: HashMap<String, Rule>,
}

impl RuleTable {
    pub fn new(name: &str) -> Self {
        RuleTable {
            name: name.to_string(),
            by_type: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register(
        &mut self,
        node_type: NodeType,
        order: Order,
        description: &str,
        handler: RuleHandler,
    ) {
        let name = match node_type {
            NodeType::Operator(op) => op.symbol().to_string(),
            other => format!("{:?}", other),
        };
        self.by_type.insert(
            node_type,
            Rule {
                name,
                description: description.to_string(),
                order,
                handler,
            },
        );
    }

    /// Register a rule for calls to the word `name`.
    pub fn register_call(&mut self, name: &str, order: Order, description: &str, handler: RuleHandler) {
        self.by_name.insert(
            name.to_string(),
            Rule {
                name: format!("{}()", name),
                description: description.to_string(),
                order,
                handler,
            },
        );
    }

    /// The rule that applies to a node of this kind, if any.
    pub fn rule_for(&self, kind: &Kind) -> Option<&Rule> {
        match kind {
            Kind::Call(name) => self
                .by_name
                .get(name)
                .or_else(|| self.by_type.get(&NodeType::Call)),
            other => self.by_type.get(&other.node_type()),
        }
    }

    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_documentation(&self) -> Vec<DocItem> {
        let mut docs: Vec<DocItem> = self
            .by_type
            .values()
            .chain(self.by_name.values())
            .map(|rule| DocItem {
                name: rule.name.clone(),
                order: rule.order,
                description: rule.description.clone(),
            })
            .collect();

        docs.sort_by(|a, b| a.name.cmp(&b.name));
        docs
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("name", &self.name)
            .field("rules", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Operator;

    #[test]
    fn test_lookup_by_type_and_name() {
        let mut table = RuleTable::new("test");
        table.register(
            NodeType::Operator(Operator::Add),
            Order::BottomUp,
            "adds",
            Arc::new(|_, _| Ok(None)),
        );
        table.register_call("random", Order::BottomUp, "random numbers", Arc::new(|_, _| Ok(Some(Node::Number(0.5)))));

        assert!(table.rule_for(&Kind::Operator(Operator::Add)).is_some());
        assert!(table.rule_for(&Kind::Operator(Operator::Sub)).is_none());
        assert!(table.rule_for(&Kind::Call("random".to_string())).is_some());
        assert!(table.rule_for(&Kind::Call("sine".to_string())).is_none());
        assert_eq!(table.len(), 2);

        let docs = table.get_documentation();
        assert_eq!(docs[0].name, "+");
        assert_eq!(docs[1].name, "random()");
    }

    #[test]
    fn test_order_flags() {
        assert!(Order::TopDown.is_top_down());
        assert!(!Order::TopDown.is_bottom_up());
        assert!(Order::Both.is_top_down() && Order::Both.is_bottom_up());
        assert!(!Order::BottomUp.is_top_down());
    }
}
