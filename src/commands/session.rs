//! Commands that inspect the pipeline or change the interpret context

use crate::commands::{CommandContext, CommandResult};
use crate::printer::{render, render_tokens, render_tree};
use colored::*;
use infinite_sounds_core::{parse, static_interpret, tokenize};

/// Handle `tokens <src>`
pub fn cmd_tokens(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: tokens <src>".to_string());
    }
    CommandResult::Message(render_tokens(&tokenize(args)))
}

/// Handle `parse <src>`
pub fn cmd_parse(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match parse(args) {
        Ok(node) => CommandResult::Message(render_tree(&node).trim_end().to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `static <src>`
pub fn cmd_static(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match static_interpret(args) {
        Ok(node) => CommandResult::Message(render(&node)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `seed [n|off]`
pub fn cmd_seed(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match args {
        "" => CommandResult::Message(match ctx.context().seed {
            Some(seed) => format!("Random seed: {}", seed),
            None => "Random seed: off".to_string(),
        }),
        "off" => {
            ctx.update(|c| c.seed = None);
            CommandResult::Message("Random seed cleared".bright_green().to_string())
        }
        n => match n.parse::<u64>() {
            Ok(seed) => {
                ctx.update(|c| c.seed = Some(seed));
                CommandResult::Message(format!("Random seed set to {}", seed).bright_green().to_string())
            }
            Err(_) => CommandResult::Error("Invalid seed. Use a non-negative integer or 'off'".to_string()),
        },
    }
}

/// Handle `set --name <src>`. The value is statically interpreted before
/// it is bound.
pub fn cmd_set(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some((name, source)) = args.split_once(char::is_whitespace) else {
        return CommandResult::Error("Usage: set --name <src>".to_string());
    };
    let name = name.trim_start_matches('-');
    if name.is_empty() {
        return CommandResult::Error("Usage: set --name <src>".to_string());
    }
    match static_interpret(source.trim()) {
        Ok(value) => {
            let message = format!("--{} = {}", name, render(&value));
            ctx.update(|c| c.set_variable(name, value));
            CommandResult::Message(message)
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `vars`
pub fn cmd_vars(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let context = ctx.context();
    if context.variables.is_empty() && context.arguments.is_empty() {
        return CommandResult::Message("No variables bound".to_string());
    }
    let mut names: Vec<&String> = context.variables.keys().collect();
    names.sort();
    let mut lines: Vec<String> = names
        .into_iter()
        .map(|name| format!("{} = {}", name.bright_blue(), render(&context.variables[name])))
        .collect();
    lines.extend(
        context
            .arguments
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{} = {}", format!("${}", i + 1).bright_blue(), render(value))),
    );
    CommandResult::Message(lines.join("\n"))
}
