//! Command registry for REPL commands
//!
//! A line is first offered to the registry; anything that is not a
//! command is interpreted as an expression.

pub mod general;
pub mod session;

use infinite_sounds_core::{InterpretContext, Interpreter, Node, SyntaxError};

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command, interpret it as an expression
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a file for changes
    Watch(String),
}

/// Session state shared by the command handlers
pub struct CommandContext {
    context: InterpretContext,
    interpreter: Interpreter,
}

impl CommandContext {
    pub fn new(context: InterpretContext) -> Self {
        let interpreter = Interpreter::new(&context);
        Self {
            context,
            interpreter,
        }
    }

    pub fn context(&self) -> &InterpretContext {
        &self.context
    }

    /// Change the interpret context. The interpreter is rebuilt, so a new
    /// seed restarts the random sequence.
    pub fn update(&mut self, change: impl FnOnce(&mut InterpretContext)) {
        change(&mut self.context);
        self.interpreter = Interpreter::new(&self.context);
    }

    /// Run the full pipeline on a line of source
    pub fn interpret(&self, input: &str) -> Result<Node, SyntaxError> {
        self.interpreter.interpret(input)
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new(InterpretContext::default())
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if let Some(rest) = input.strip_prefix(prefix.as_str()) {
                if rest.is_empty() || rest.starts_with(' ') {
                    return handler(rest.trim(), ctx);
                }
            }
        }
        CommandResult::NotACommand
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("watch", general::cmd_watch);
    registry.register("rules", general::cmd_rules);

    registry.register("tokens", session::cmd_tokens);
    registry.register("parse", session::cmd_parse);
    registry.register("static", session::cmd_static);
    registry.register("seed", session::cmd_seed);
    registry.register("set", session::cmd_set);
    registry.register("vars", session::cmd_vars);

    registry
}
