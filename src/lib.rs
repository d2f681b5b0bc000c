//! # InfiniteSounds
//!
//! Command-line front end for the InfiniteSounds audio language. The
//! language itself lives in `infinite-sounds-core`; this crate adds an
//! interactive REPL with file watching, a one-shot command line and
//! coloured tree rendering.
//!
//! ## Modules
//!
//! - `cli`: command-line options and one-shot interpretation
//! - `commands`: REPL commands (`tokens`, `parse`, `static`, `seed`, `set`, ...)
//! - `printer`: coloured rendering of tokens and trees, and JSON output
//! - `repl`: the Read-Eval-Print Loop and its file watcher

pub mod cli;
pub mod commands;
pub mod printer;
pub mod repl;

pub use infinite_sounds_core::{interpret, static_interpret, InterpretContext, Node};
