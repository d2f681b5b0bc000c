//! # InfiniteSounds Core
//!
//! Tokenizer, parser and rewrite-pass interpreter for the InfiniteSounds
//! audio language. Text goes in, a normalized expression tree comes out,
//! ready for an audio graph builder. No I/O and no audio dependencies.
//!
//! ## Features
//!
//! - **serde**: derive `Serialize` for the tree so it can be handed over as JSON
//!
//! ## Example
//!
//! ```
//! use infinite_sounds_core::{interpret, InterpretContext, Node};
//!
//! let mut ctx = InterpretContext::new().with_seed(1);
//! ctx.set_variable("level", Node::Number(0.5));
//! let tree = interpret("sine(220*2) > gain(--level)", &ctx).unwrap();
//! assert_eq!(tree.to_string(), "(sine(440) > gain(0.5))");
//! ```

pub mod interpreter;
pub mod parser;
pub mod types;

pub use interpreter::{
    interpret, static_interpret, static_interpret_node, InterpretContext, Interpreter,
};
pub use parser::{parse, tokenize, Node, SyntaxError};
pub use types::{AbsNote, Mode, RelNote};
