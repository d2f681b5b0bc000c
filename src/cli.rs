//! Command-line options and one-shot interpretation

use crate::printer::{render, render_json, render_tokens, render_tree};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use infinite_sounds_core::{
    parse, static_interpret, static_interpret_node, tokenize, InterpretContext, Interpreter,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "infinite-sounds",
    version,
    about = "Interpret InfiniteSounds expressions into audio graph trees"
)]
pub struct Cli {
    /// Expression to interpret; starts the REPL when neither this nor --file is given
    pub expr: Option<String>,

    /// Read the expression from a file
    #[arg(short, long, value_name = "PATH", conflicts_with = "expr")]
    pub file: Option<PathBuf>,

    /// Stop after the static passes (lists, math, music)
    #[arg(long = "static")]
    pub static_only: bool,

    /// Seed for random(...)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Bind a variable, statically interpreted: --var level=0.5
    #[arg(long = "var", value_name = "NAME=EXPR")]
    pub vars: Vec<String>,

    /// Positional argument for $1, $2, ...
    #[arg(long = "arg", value_name = "EXPR")]
    pub args: Vec<String>,

    /// Print the tokens instead of interpreting
    #[arg(long, conflicts_with = "parse")]
    pub tokens: bool,

    /// Print the parsed tree instead of interpreting
    #[arg(long)]
    pub parse: bool,

    /// Print the tree as JSON
    #[arg(long)]
    pub json: bool,

    /// Watch a file in the REPL and re-interpret it on every change
    #[arg(long, value_name = "PATH")]
    pub watch: Option<PathBuf>,
}

impl Cli {
    /// The interpret context from --seed, --var and --arg
    pub fn context(&self) -> Result<InterpretContext> {
        let mut ctx = InterpretContext::new();
        ctx.seed = self.seed;
        for var in &self.vars {
            let (name, source) = var
                .split_once('=')
                .ok_or_else(|| anyhow!("--var expects NAME=EXPR, got '{}'", var))?;
            let value = static_interpret(source)
                .with_context(|| format!("in the value of --var {}", name))?;
            ctx.set_variable(name.trim(), value);
        }
        for (i, arg) in self.args.iter().enumerate() {
            let value =
                static_interpret(arg).with_context(|| format!("in --arg ${}", i + 1))?;
            ctx.arguments.push(value);
        }
        Ok(ctx)
    }

    /// The source to interpret once, if any
    pub fn source(&self) -> Result<Option<String>> {
        if let Some(path) = &self.file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return Ok(Some(text));
        }
        Ok(self.expr.clone())
    }

    /// Whether to start the interactive loop
    pub fn interactive(&self) -> bool {
        self.watch.is_some() || (self.expr.is_none() && self.file.is_none())
    }

    /// Run one source through the requested stages and render the result
    pub fn run(&self, source: &str) -> Result<String> {
        if self.tokens {
            return Ok(render_tokens(&tokenize(source)));
        }
        let tree = parse(source)?;
        if self.parse {
            if self.json {
                return Ok(render_json(&tree)?);
            }
            return Ok(render_tree(&tree).trim_end().to_string());
        }

        let tree = if self.static_only {
            static_interpret_node(&tree)?
        } else {
            let ctx = self.context()?;
            info!(
                variables = ctx.variables.len(),
                arguments = ctx.arguments.len(),
                seed = ?ctx.seed,
                "interpreting"
            );
            Interpreter::new(&ctx).interpret_node(&tree)?
        };

        if self.json {
            Ok(render_json(&tree)?)
        } else {
            Ok(render(&tree))
        }
    }
}

/// Fail early on options that only make sense with a source
pub fn validate(cli: &Cli) -> Result<()> {
    if cli.interactive() && (cli.tokens || cli.parse || cli.json) && cli.watch.is_none() {
        bail!("--tokens, --parse and --json need an expression or --file");
    }
    Ok(())
}
