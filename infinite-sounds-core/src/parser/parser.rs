use crate::parser::ast::{Array, Kind, Node, Operator, Variable};
use crate::parser::error::{Result, SyntaxError};
use crate::parser::lexer::{tokenize, Token};

/// Recursive descent parser for the InfiniteSounds language.
///
/// Expressions are read as a flat `operand operator operand ...` list and
/// then reduced by operator priority, so `1+2*3` becomes `1+(2*3)`.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

/// What came before the current position inside a bracket group
enum Previous {
    Start,
    Comma,
    Node(Node),
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Consume the current token. Illegal tokens are reported here.
    fn next_token(&mut self) -> Result<Option<Token>> {
        match self.tokens.get(self.position) {
            None => Ok(None),
            Some(Token::Error(text)) => Err(illegal_token(text)),
            Some(token) => {
                let token = token.clone();
                self.position += 1;
                Ok(Some(token))
            }
        }
    }

    /// Parse all tokens into a single expression
    pub fn parse(&mut self) -> Result<Node> {
        let node = self.parse_expressions()?;
        match self.peek() {
            None => Ok(node),
            Some(Token::Error(text)) => Err(illegal_token(text)),
            Some(_) => Err(SyntaxError::new("the main css audio pipe is broken")),
        }
    }

    /// Parse `node (operator node)*` and reduce by priority
    fn parse_expressions(&mut self) -> Result<Node> {
        let mut nodes = vec![self.parse_node()?.unwrap_or(Node::Undefined)];
        let mut ops = Vec::new();
        while let Some(op) = self.parse_operator() {
            ops.push(op);
            nodes.push(self.parse_node()?.unwrap_or(Node::Undefined));
        }
        Ok(sort_operators(nodes, ops))
    }

    fn parse_node(&mut self) -> Result<Option<Node>> {
        match self.peek() {
            None => Ok(None),
            Some(Token::Error(text)) => Err(illegal_token(text)),
            Some(Token::LeftParen) => self.parse_block(),
            Some(Token::LeftBracket) => {
                let items = self.parse_group_array(Token::LeftBracket, Token::RightBracket)?;
                Ok(Some(Node::from(Array::new(items))))
            }
            Some(_) => self.parse_unit(),
        }
    }

    /// `( expr )`: a parenthesized group holds exactly one expression
    fn parse_block(&mut self) -> Result<Option<Node>> {
        let mut args = self.parse_group_array(Token::LeftParen, Token::RightParen)?;
        if args.len() > 1 {
            return Err(SyntaxError::new("(block, with, comma, is, not, allowed)"));
        }
        Ok(Some(args.pop().unwrap_or(Node::Undefined)))
    }

    /// A comma separated group. Missing elements between commas, or before
    /// and after a comma at the edges, become `undefined` holes.
    fn parse_group_array(&mut self, start: Token, end: Token) -> Result<Vec<Node>> {
        self.next_token()?; // eat ( [
        let mut items = Vec::new();
        let mut previous = Previous::Start;
        loop {
            match self.peek() {
                None => {
                    return Err(SyntaxError::new(format!(
                        "Forgot to close {}-block.",
                        start
                    )))
                }
                Some(token) if *token == end => {
                    self.position += 1;
                    if matches!(previous, Previous::Comma) {
                        items.push(Node::Undefined);
                    }
                    return Ok(items);
                }
                Some(Token::Comma) => {
                    if matches!(previous, Previous::Comma | Previous::Start) {
                        items.push(Node::Undefined);
                    }
                    previous = Previous::Comma;
                    self.position += 1;
                    continue;
                }
                Some(_) => {}
            }
            if let Previous::Node(node) = &previous {
                return Err(SyntaxError::new(format!(
                    "Forgot ',' or '{}' after: {}",
                    end, node
                )));
            }
            let node = self.parse_expressions()?;
            items.push(node.clone());
            previous = Previous::Node(node);
        }
    }

    /// Read an operator. A negative number directly after an operand is
    /// split into a minus operator and a positive number, so that `a-2`
    /// is a subtraction.
    fn parse_operator(&mut self) -> Option<Operator> {
        match self.tokens.get_mut(self.position)? {
            Token::Number { literal, value, .. } if literal.starts_with('-') => {
                literal.remove(0);
                *value = -*value;
                Some(Operator::Sub)
            }
            Token::Operator(op) => {
                let op = *op;
                self.position += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn parse_unit(&mut self) -> Result<Option<Node>> {
        if let Some(node) = self.parse_function()? {
            return Ok(Some(node));
        }
        self.parse_primitive()
    }

    /// Notes, words and variables, each optionally followed by an
    /// argument list
    fn parse_function(&mut self) -> Result<Option<Node>> {
        if !self.peek().is_some_and(Token::is_callable) {
            return Ok(None);
        }
        let token = match self.next_token()? {
            Some(token) => token,
            None => return Ok(None),
        };
        let args = if self.peek() == Some(&Token::LeftParen) {
            Some(self.parse_group_array(Token::LeftParen, Token::RightParen)?)
        } else {
            None
        };

        let note = match token {
            Token::AbsNote(note) => Node::abs_note(note),
            Token::RelNote(note) => Node::rel_note(note),
            Token::AlphaNote(note) => Node::expr(Kind::AlphaNote(note), Vec::new()),
            Token::Word(name) => {
                return Ok(Some(Node::call(name.to_lowercase(), args.unwrap_or_default())))
            }
            Token::CssVariable(name) => {
                return Ok(Some(Node::expr(
                    Kind::Variable(Variable::Css(name)),
                    args.unwrap_or_default(),
                )))
            }
            Token::DollarVariable(index) => {
                return Ok(Some(Node::expr(
                    Kind::Variable(Variable::Positional(index)),
                    args.unwrap_or_default(),
                )))
            }
            _ => return Ok(None),
        };
        Ok(Some(match args {
            Some(args) => {
                let mut body = Vec::with_capacity(args.len() + 1);
                body.push(note);
                body.extend(args);
                Node::expr(Kind::ExpFun, body)
            }
            None => note,
        }))
    }

    fn parse_primitive(&mut self) -> Result<Option<Node>> {
        match self.peek() {
            Some(Token::Text(_)) | Some(Token::Number { .. }) => {}
            _ => return Ok(None),
        }
        Ok(match self.next_token()? {
            Some(Token::Text(text)) => Some(Node::text(&text)),
            Some(Token::Number { value, unit, .. }) if unit.is_empty() => Some(Node::Number(value)),
            Some(Token::Number { value, unit, .. }) => {
                Some(Node::call(unit.to_lowercase(), vec![Node::Number(value)]))
            }
            _ => None,
        })
    }
}

fn illegal_token(text: &str) -> SyntaxError {
    SyntaxError::new(format!("InfiniteSound: Illegal token: {}", text))
}

/// Repeatedly reduce the operator with the lowest priority number, the
/// leftmost one on ties, until a single node remains.
fn sort_operators(mut nodes: Vec<Node>, mut ops: Vec<Operator>) -> Node {
    while !ops.is_empty() {
        let index = ops
            .iter()
            .enumerate()
            .min_by_key(|(_, op)| op.priority())
            .map_or(0, |(i, _)| i);
        let op = ops.remove(index);
        let right = nodes.remove(index + 1);
        let left = std::mem::replace(&mut nodes[index], Node::Undefined);
        nodes[index] = Node::binary(op, left, right);
    }
    nodes.pop().unwrap_or(Node::Undefined)
}

/// Tokenize and parse a source string.
pub fn parse(input: &str) -> Result<Node> {
    Parser::new(tokenize(input)).parse()
}
