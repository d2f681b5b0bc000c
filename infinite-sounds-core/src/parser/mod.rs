pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Array, ClefKey, Expr, Kind, Node, NodeType, Operator, Variable};
pub use error::{Result, SyntaxError};
pub use lexer::{tokenize, Lexer, Token};
pub use parser::{parse, Parser};
