//! Coloured rendering of tokens and trees for the terminal

use colored::*;
use infinite_sounds_core::parser::{Expr, Kind, Token};
use infinite_sounds_core::Node;
use std::fmt::Display;

/// One line, in the same shape as the tree's `Display`, with colour.
pub fn render(node: &Node) -> String {
    match node {
        Node::Undefined => "undefined".dimmed().to_string(),
        Node::Number(n) => n.to_string().yellow().to_string(),
        Node::Text(text) => format!("'{}'", text).green().to_string(),
        Node::Array(array) => format!("[{}]", render_list(array.items())),
        Node::Expr(expr) => render_expr(expr),
    }
}

fn render_list(items: &[Node]) -> String {
    items
        .iter()
        .map(|item| {
            if item.is_undefined() {
                String::new()
            } else {
                render(item)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_expr(expr: &Expr) -> String {
    let items = expr.body.items();
    match &expr.kind {
        Kind::Operator(op) => {
            let symbol = op.symbol().bright_white().bold().to_string();
            let mut out = String::from("(");
            for (i, item) in items.iter().enumerate() {
                match (i, item) {
                    // prefix form
                    (0, Node::Undefined) => out.push_str(&symbol),
                    (0, item) => out.push_str(&render(item)),
                    (1, item) if items[0].is_undefined() => out.push_str(&render(item)),
                    (_, item) => out.push_str(&format!(" {} {}", symbol, render(item))),
                }
            }
            out.push(')');
            out
        }
        Kind::ExpFun => match items.split_first() {
            Some((head, args)) => format!("{}({})", render(head), render_list(args)),
            None => "()".to_string(),
        },
        kind => {
            let head = match kind {
                Kind::AbsNote(note) => note.to_string().bright_magenta().to_string(),
                Kind::RelNote(note) => note.to_string().magenta().to_string(),
                Kind::Note(note) => note.to_string().magenta().to_string(),
                Kind::AlphaNote(note) => note.to_string().magenta().to_string(),
                Kind::Clef(key) => key.to_string().bright_magenta().bold().to_string(),
                Kind::Variable(var) => var.to_string().bright_blue().to_string(),
                Kind::Mix => "[]".bright_white().bold().to_string(),
                other => other.name().cyan().to_string(),
            };
            if items.is_empty() {
                head
            } else {
                format!("{}({})", head, render_list(items))
            }
        }
    }
}

/// An indented outline, one node per line.
pub fn render_tree(node: &Node) -> String {
    let mut out = String::new();
    outline(node, 0, &mut out);
    out
}

fn outline(node: &Node, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Array(array) => {
            out.push_str(&format!("{}{}\n", indent, "array".bright_white()));
            for item in array.iter() {
                outline(item, depth + 1, out);
            }
        }
        Node::Expr(expr) => {
            let label = match &expr.kind {
                Kind::Operator(op) => op.symbol().bright_white().bold().to_string(),
                Kind::Call(name) => name.cyan().to_string(),
                Kind::Variable(var) => var.to_string().bright_blue().to_string(),
                Kind::AbsNote(note) => note.to_string().bright_magenta().to_string(),
                Kind::RelNote(note) => note.to_string().magenta().to_string(),
                Kind::Note(note) => note.to_string().magenta().to_string(),
                Kind::AlphaNote(note) => note.to_string().magenta().to_string(),
                Kind::Clef(key) => format!("clef {}", key).bright_magenta().to_string(),
                Kind::ExpFun => "expFun".cyan().to_string(),
                Kind::Mix => "mix".bright_white().to_string(),
            };
            out.push_str(&format!("{}{}\n", indent, label));
            for item in expr.body.iter() {
                outline(item, depth + 1, out);
            }
        }
        leaf => out.push_str(&format!("{}{}\n", indent, render(leaf))),
    }
}

fn token_class(token: &Token) -> &'static str {
    match token {
        Token::AbsNote(_) => "absNote",
        Token::RelNote(_) => "relNote",
        Token::AlphaNote(_) => "alphaNote",
        Token::Word(_) => "word",
        Token::CssVariable(_) | Token::DollarVariable(_) => "variable",
        Token::Number { .. } => "number",
        Token::LeftParen
        | Token::RightParen
        | Token::LeftBracket
        | Token::RightBracket
        | Token::Comma => "bracket",
        Token::Operator(_) => "operator",
        Token::Text(_) => "string",
        Token::Error(_) => "error",
    }
}

/// One token per line: class, then the text it was read from.
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| {
            let class = format!("{:<10}", token_class(token));
            let class = match token {
                Token::Error(_) => class.red().to_string(),
                _ => class.dimmed().to_string(),
            };
            format!("{} {}", class, token)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON for an external audio graph builder
pub fn render_json(node: &Node) -> serde_json::Result<String> {
    serde_json::to_string_pretty(node)
}

pub fn format_error(err: impl Display) -> String {
    format!("{} {}", "Error:".bright_red().bold(), err.to_string().red())
}
