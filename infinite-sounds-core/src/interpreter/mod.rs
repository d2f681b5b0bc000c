//! The rewrite pipeline.
//!
//! A parsed tree is normalized by running the [`walker`] over it once per
//! rule table, in a fixed order:
//!
//! ```text
//! ListOps -> MathOps1 -> MathOps2 -> Music            (static_interpret)
//!         -> Random -> InterpreterFunctions -> AudioPiping   (interpret)
//! ```
//!
//! Each pass sees the output of the previous one; an error in any pass
//! aborts the whole run.

pub mod context;
pub mod scope;
pub mod table;
pub mod tables;
pub mod walker;

pub use context::InterpretContext;
pub use scope::{Frame, Scope};
pub use table::{DocItem, Order, Rule, RuleHandler, RuleTable};
pub use walker::interpret_node;

use crate::parser::ast::Node;
use crate::parser::error::Result;
use crate::parser::parse;
use std::sync::OnceLock;
use tracing::debug;

static STATIC_TABLES: OnceLock<Vec<RuleTable>> = OnceLock::new();
static AUDIO_PIPING: OnceLock<RuleTable> = OnceLock::new();

/// The context-free passes, in the order they run.
pub fn static_tables() -> &'static [RuleTable] {
    STATIC_TABLES.get_or_init(|| {
        vec![
            tables::list_ops::table(),
            tables::math_ops::math1(),
            tables::math_ops::math2(),
            tables::music::table(),
        ]
    })
}

fn audio_piping() -> &'static RuleTable {
    AUDIO_PIPING.get_or_init(tables::audio_piping::table)
}

/// Run a single table over the whole tree from a fresh root scope.
pub fn run_pass(node: &Node, table: &RuleTable) -> Result<Node> {
    let result = interpret_node(node, table, Scope::root())?;
    debug!(
        table = table.name(),
        changed = !result.is_same(node),
        "rewrite pass"
    );
    Ok(result)
}

/// Parse `text` and apply the context-free passes.
pub fn static_interpret(text: &str) -> Result<Node> {
    static_interpret_node(&parse(text)?)
}

pub fn static_interpret_node(node: &Node) -> Result<Node> {
    static_tables()
        .iter()
        .try_fold(node.clone(), |node, table| run_pass(&node, table))
}

/// The full pipeline, bound to one [`InterpretContext`].
///
/// The random generator lives as long as the interpreter, so repeated
/// calls with a seeded context continue the same sequence.
pub struct Interpreter {
    random: RuleTable,
    functions: RuleTable,
}

impl Interpreter {
    pub fn new(ctx: &InterpretContext) -> Self {
        Interpreter {
            random: tables::random::table(ctx.seed),
            functions: tables::functions::table(ctx),
        }
    }

    pub fn interpret(&self, text: &str) -> Result<Node> {
        self.interpret_node(&parse(text)?)
    }

    pub fn interpret_node(&self, node: &Node) -> Result<Node> {
        let node = static_interpret_node(node)?;
        [&self.random, &self.functions, audio_piping()]
            .into_iter()
            .try_fold(node, |node, table| run_pass(&node, table))
    }

    /// Every pass this interpreter runs, in order.
    pub fn tables(&self) -> Vec<&RuleTable> {
        let mut tables: Vec<&RuleTable> = static_tables().iter().collect();
        tables.extend([&self.random, &self.functions, audio_piping()]);
        tables
    }
}

/// Parse `text` and run every pass with the caller's context.
pub fn interpret(text: &str, ctx: &InterpretContext) -> Result<Node> {
    Interpreter::new(ctx).interpret(text)
}
