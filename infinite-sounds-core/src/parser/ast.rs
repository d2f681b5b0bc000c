use crate::types::note::{AbsNote, AlphaNote, Note, RelNote};
use std::fmt;
use std::sync::Arc;

/// Binary (and prefix) operators of the InfiniteSounds language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Operator {
    /// `|` css audio pipe separator
    Pipe,
    /// `>` audio connect
    Connect,
    /// `:` list concatenation
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    /// `%` mode step / modulo
    Mod,
    /// `^` power
    Pow,
    /// `^+` chromatic step up
    StepUp,
    /// `^-` chromatic step down
    StepDown,
    /// `^^` octave step
    Octave,
    /// `^~` reserved, no rewrite rule uses it
    Fifth,
    /// `~` seven-scale step
    Seven,
    /// `!` freeze
    Freeze,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Some(match symbol {
            "|" => Operator::Pipe,
            ">" => Operator::Connect,
            ":" => Operator::Concat,
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "^" => Operator::Pow,
            "^+" => Operator::StepUp,
            "^-" => Operator::StepDown,
            "^^" => Operator::Octave,
            "^~" => Operator::Fifth,
            "~" => Operator::Seven,
            "!" => Operator::Freeze,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Pipe => "|",
            Operator::Connect => ">",
            Operator::Concat => ":",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "^",
            Operator::StepUp => "^+",
            Operator::StepDown => "^-",
            Operator::Octave => "^^",
            Operator::Fifth => "^~",
            Operator::Seven => "~",
            Operator::Freeze => "!",
        }
    }

    /// Reduction priority: the operator with the lowest number is reduced
    /// first. Operators without an entry are reduced last.
    pub fn priority(self) -> u32 {
        match self {
            Operator::Concat => 1,
            Operator::Mul | Operator::Div => 10,
            Operator::Add | Operator::Sub => 100,
            Operator::Connect => 100_000,
            Operator::Pipe => 1_000_000,
            _ => u32::MAX,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A variable reference, resolved from the interpret context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Variable {
    /// `--name`, stored with its leading dashes
    Css(String),
    /// `$1`, `$2`, ...
    Positional(usize),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Css(name) => write!(f, "{}", name),
            Variable::Positional(index) => write!(f, "${}", index),
        }
    }
}

/// The anchor a clef establishes for the notes below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ClefKey {
    Absolute(AbsNote),
    Relative(RelNote),
}

impl fmt::Display for ClefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClefKey::Absolute(note) => write!(f, "{}", note),
            ClefKey::Relative(note) => write!(f, "{}", note),
        }
    }
}

/// What an expression node is. Every kind carries a body of child nodes in
/// [`Expr::body`]; the kind only holds the node's own payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Operator(Operator),
    /// Word calls and unit wrappers, name lowercased: `sine(440)`, `12hz`
    Call(String),
    Variable(Variable),
    AbsNote(AbsNote),
    RelNote(RelNote),
    /// Transient merged note form
    Note(Note),
    AlphaNote(AlphaNote),
    /// A note followed by an argument list; the note is the first body item
    ExpFun,
    /// A note-keyed scope
    Clef(ClefKey),
    /// `[]` parallel mix of audio chains
    Mix,
}

/// Rule-table key derived from a [`Kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Operator(Operator),
    Call,
    Variable,
    AbsNote,
    RelNote,
    Note,
    AlphaNote,
    ExpFun,
    Clef,
    Mix,
}

impl Kind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Kind::Operator(op) => NodeType::Operator(*op),
            Kind::Call(_) => NodeType::Call,
            Kind::Variable(_) => NodeType::Variable,
            Kind::AbsNote(_) => NodeType::AbsNote,
            Kind::RelNote(_) => NodeType::RelNote,
            Kind::Note(_) => NodeType::Note,
            Kind::AlphaNote(_) => NodeType::AlphaNote,
            Kind::ExpFun => NodeType::ExpFun,
            Kind::Clef(_) => NodeType::Clef,
            Kind::Mix => NodeType::Mix,
        }
    }

    /// The `type` discriminator used when the tree is handed to an audio
    /// graph builder.
    pub fn name(&self) -> String {
        match self {
            Kind::Operator(op) => op.symbol().to_string(),
            Kind::Call(name) => name.clone(),
            Kind::Variable(var) => var.to_string(),
            Kind::AbsNote(_) => "absNote".to_string(),
            Kind::RelNote(_) => "relNote".to_string(),
            Kind::Note(_) => "Note".to_string(),
            Kind::AlphaNote(_) => "alphaNote".to_string(),
            Kind::ExpFun => "expFun".to_string(),
            Kind::Clef(_) => "clef".to_string(),
            Kind::Mix => "[]".to_string(),
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(
            self,
            Kind::AbsNote(_) | Kind::RelNote(_) | Kind::Note(_) | Kind::AlphaNote(_)
        )
    }
}

/// An ordered sequence of nodes. `dirty` is set at construction when any
/// element is not primitive, and tells the walker whether descending into
/// the sequence can change anything.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Array {
    items: Arc<[Node]>,
    #[cfg_attr(feature = "serde", serde(skip))]
    dirty: bool,
}

impl Array {
    pub fn new(items: Vec<Node>) -> Self {
        let dirty = items.iter().any(|node| !node.is_primitive());
        Array {
            items: items.into(),
            dirty,
        }
    }

    pub fn empty() -> Self {
        Array::new(Vec::new())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    /// True when both arrays share the same allocation.
    pub fn is_same(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl From<Vec<Node>> for Array {
    fn from(items: Vec<Node>) -> Self {
        Array::new(items)
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A typed node with a body of children.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: Kind,
    pub body: Array,
}

impl Expr {
    pub fn new(kind: Kind, body: Vec<Node>) -> Self {
        Expr {
            kind,
            body: Array::new(body),
        }
    }

    /// Left and right operand of a binary operator node.
    pub fn operands(&self) -> Option<(&Node, &Node)> {
        match self.body.items() {
            [left, right] => Some((left, right)),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            Kind::Operator(op) => Some(op),
            _ => None,
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Expr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind.name())?;
        match &self.kind {
            Kind::AbsNote(note) => map.serialize_entry("note", note)?,
            Kind::RelNote(note) => map.serialize_entry("note", note)?,
            Kind::Note(note) => map.serialize_entry("note", note)?,
            Kind::AlphaNote(note) => map.serialize_entry("note", note)?,
            Kind::Clef(key) => map.serialize_entry("key", key)?,
            _ => {}
        }
        map.serialize_entry("body", &self.body)?;
        map.end()
    }
}

/// A node of the expression tree. Subtrees are shared through `Arc`, so a
/// rewrite that leaves a node unchanged hands back the same allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Node {
    Undefined,
    Number(f64),
    Text(Arc<str>),
    Array(Array),
    Expr(Arc<Expr>),
}

impl Node {
    pub fn expr(kind: Kind, body: Vec<Node>) -> Node {
        Node::Expr(Arc::new(Expr::new(kind, body)))
    }

    pub fn binary(op: Operator, left: Node, right: Node) -> Node {
        Node::expr(Kind::Operator(op), vec![left, right])
    }

    pub fn call(name: impl Into<String>, body: Vec<Node>) -> Node {
        Node::expr(Kind::Call(name.into()), body)
    }

    pub fn text(text: &str) -> Node {
        Node::Text(Arc::from(text))
    }

    pub fn abs_note(note: AbsNote) -> Node {
        Node::expr(Kind::AbsNote(note), Vec::new())
    }

    pub fn rel_note(note: RelNote) -> Node {
        Node::expr(Kind::RelNote(note), Vec::new())
    }

    /// Undefined, numbers, strings and clean arrays.
    pub fn is_primitive(&self) -> bool {
        match self {
            Node::Undefined | Node::Number(_) | Node::Text(_) => true,
            Node::Array(array) => !array.is_dirty(),
            Node::Expr(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number as an `i32` when it is a whole number in range.
    pub fn as_integer(&self) -> Option<i32> {
        let n = self.as_number()?;
        if n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) {
            Some(n as i32)
        } else {
            None
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Node::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<&Kind> {
        self.as_expr().map(|expr| &expr.kind)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Node::Undefined)
    }

    pub fn is_note(&self) -> bool {
        self.kind().is_some_and(Kind::is_note)
    }

    /// Identity rather than structural equality: true when both nodes are
    /// the same shared allocation, or equal scalars.
    pub fn is_same(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Expr(a), Node::Expr(b)) => Arc::ptr_eq(a, b),
            (Node::Array(a), Node::Array(b)) => a.is_same(b),
            (Node::Text(a), Node::Text(b)) => Arc::ptr_eq(a, b),
            (Node::Number(a), Node::Number(b)) => a.to_bits() == b.to_bits(),
            (Node::Undefined, Node::Undefined) => true,
            _ => false,
        }
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Number(n)
    }
}

impl From<Array> for Node {
    fn from(array: Array) -> Self {
        Node::Array(array)
    }
}

impl From<Expr> for Node {
    fn from(expr: Expr) -> Self {
        Node::Expr(Arc::new(expr))
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Node]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        if !item.is_undefined() {
            write!(f, "{}", item)?;
        }
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Undefined => write!(f, "undefined"),
            Node::Number(n) => write!(f, "{}", n),
            Node::Text(text) => write!(f, "'{}'", text),
            Node::Array(array) => {
                write!(f, "[")?;
                write_list(f, array.items())?;
                write!(f, "]")
            }
            Node::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.body.items();
        match &self.kind {
            Kind::Operator(op) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    match (i, item) {
                        (0, Node::Undefined) => write!(f, "{}", op)?,
                        (0, item) => write!(f, "{}", item)?,
                        (1, item) if items[0].is_undefined() => write!(f, "{}", item)?,
                        (_, item) => write!(f, " {} {}", op, item)?,
                    }
                }
                write!(f, ")")
            }
            Kind::ExpFun => {
                let (head, args) = match items.split_first() {
                    Some((head, args)) => (head.to_string(), args),
                    None => (String::new(), items),
                };
                write!(f, "{}(", head)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            kind => {
                match kind {
                    Kind::AbsNote(note) => write!(f, "{}", note)?,
                    Kind::RelNote(note) => write!(f, "{}", note)?,
                    Kind::Note(note) => write!(f, "{}", note)?,
                    Kind::AlphaNote(note) => write!(f, "{}", note)?,
                    Kind::Clef(key) => write!(f, "{}", key)?,
                    other => write!(f, "{}", other.name())?,
                }
                if !items.is_empty() {
                    write!(f, "(")?;
                    write_list(f, items)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}
