//! General REPL commands (help, quit, watch, rules)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `watch [file]` command
pub fn cmd_watch(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <file>".to_string());
    }
    CommandResult::Watch(args.to_string())
}

/// Handle `rules [table]`: list the rewrite rules of every pass, or of the
/// passes whose name starts with the argument (case-insensitive).
pub fn cmd_rules(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let filter = args.to_lowercase();
    let mut out = Vec::new();
    for table in ctx.interpreter().tables() {
        if !table.name().to_lowercase().starts_with(&filter) {
            continue;
        }
        out.push(format!("{}", table.name().green()));
        for doc in table.get_documentation() {
            out.push(format!(
                "  {:<10} {:<10} {}",
                doc.name.cyan(),
                doc.order.to_string().dimmed(),
                doc.description
            ));
        }
    }
    if out.is_empty() {
        return CommandResult::Error(format!("No rule table named '{}'", args));
    }
    CommandResult::Message(out.join("\n"))
}

fn print_help() {
    println!("{}", "InfiniteSounds Help".bold());
    println!("{}", "===================".bold());
    println!();
    println!("{}", "Expressions:".green());
    println!("  {}      - Audio chain", "sine(440) > gain(0.5)".cyan());
    println!("  {}   - Parallel mix", "[sine(220), square(110)]".cyan());
    println!("  {}              - Units: hz, khz, s, ms", "2khz".cyan());
    println!("  {}           - Random number in [100, 200)", "random(100, 200)".cyan());
    println!("  {}      - Low frequency oscillator", "lfo(2, 'sine', 0, 1)".cyan());
    println!();
    println!("{}", "Notes:".green());
    println!("  {}            - Absolute note with mode", "C#4lyd".cyan());
    println!("  {}       - Clef: notes inside become relative", "C4(E4, G4)".cyan());
    println!("  {}         - Octave up", "C4*2  C4^^1".cyan());
    println!("  {}        - Chromatic steps", "C4^+1  C4^-2".cyan());
    println!("  {}          - Scale steps, mode shift", "C4 ~ 2  C4lyd%1".cyan());
    println!("  {}               - Freeze a note against its clef", "!E4".cyan());
    println!();
    println!("{}", "Commands:".green());
    println!("  {}     - Show the tokens of a source", "tokens <src>".cyan());
    println!("  {}      - Show the parsed tree", "parse <src>".cyan());
    println!("  {}     - Run only the static passes", "static <src>".cyan());
    println!("  {}    - Fix or clear the random seed", "seed [n|off]".cyan());
    println!("  {} - Bind a variable", "set --name <src>".cyan());
    println!("  {}             - List bound variables", "vars".cyan());
    println!("  {}    - List rewrite rules", "rules [table]".cyan());
    println!("  {}     - Re-interpret a file when it changes", "watch <file>".cyan());
    println!("  {}             - Show this help", "help".bright_green());
    println!("  {}             - Exit the REPL", "quit".bright_red());
}
