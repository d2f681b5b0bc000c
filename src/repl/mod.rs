//! REPL (Read-Eval-Print Loop) for the InfiniteSounds language

use crate::commands::{create_registry, CommandContext, CommandResult};
use crate::printer::{format_error, render};
use crate::repl::watcher::{is_reload, FileWatcher};
use anyhow::Result;
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use infinite_sounds_core::InterpretContext;
use notify::Event;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::path::Path;
use std::thread;
use tracing::debug;

pub mod watcher;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// Interpret a line and render the tree, or the error
pub fn evaluate(ctx: &CommandContext, source: &str) -> String {
    match ctx.interpret(source) {
        Ok(node) => render(&node),
        Err(e) => format_error(e),
    }
}

/// Read a watched file and interpret its whole content as one expression
pub fn reload(ctx: &CommandContext, path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => evaluate(ctx, &contents),
        Err(e) => format_error(format!("Failed to read {}: {}", path.display(), e)),
    }
}

/// Interactive REPL for the InfiniteSounds language
pub struct Repl {
    editor: Option<DefaultEditor>,
    commands: CommandContext,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,

    watcher: Option<FileWatcher>,
}

impl Repl {
    pub fn new(context: InterpretContext) -> RustylineResult<Self> {
        let editor = DefaultEditor::new()?;
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            commands: CommandContext::new(context),
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        })
    }

    /// Start watching a file; the watcher is created on first use
    pub fn watch(&mut self, path: &str) {
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => {
                    println!("{}", format_error(format!("Failed to create watcher: {}", e)));
                    return;
                }
            }
        }

        if let Some(w) = &mut self.watcher {
            match w.watch(path) {
                Ok(()) => {
                    println!("Watching {} for changes...", path.bright_green());
                    println!("{}", reload(&self.commands, Path::new(path)));
                }
                Err(e) => println!("{}", format_error(format!("Failed to watch {}: {}", path, e))),
            }
        }
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "InfiniteSounds".bright_cyan().bold());
        println!(
            "Type expressions like: {}, {}, {}",
            "sine(440) > gain(0.5)".cyan(),
            "C4(E4, G4)".cyan(),
            "random(100, 200)".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow::anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "sounds>".bright_magenta().bold());
            match editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        let registry = create_registry();

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if line.is_empty() {
                            continue;
                        }
                        match registry.execute(&line, &mut self.commands) {
                            CommandResult::Success => {}
                            CommandResult::Message(msg) => println!("{}", msg),
                            CommandResult::Exit => {
                                println!("{}", "Goodbye!".bright_cyan());
                                break;
                            }
                            CommandResult::Error(e) => println!("{}", format_error(e)),
                            CommandResult::Watch(path) => self.watch(&path),
                            CommandResult::NotACommand => {
                                println!("{}", evaluate(&self.commands, &line));
                            }
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{}", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!("{}", format_error(format!("Error reading input: {}", err)));
                    }
                    Err(_) => break,
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) if is_reload(&event) => {
                        for path in &event.paths {
                            debug!(path = %path.display(), "watched file changed");
                            println!("{} {}", "File changed:".bright_yellow(), path.display());
                            println!("{}", reload(&self.commands, path));
                        }
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => println!("{}", format_error(format!("Watch error: {}", e))),
                    Err(_) => break,
                }
            }
        }

        Ok(())
    }
}

/// Start the REPL, optionally watching a file from the start
pub fn start(context: InterpretContext, watch: Option<&Path>) -> Result<()> {
    let mut repl =
        Repl::new(context).map_err(|e| anyhow::anyhow!("Failed to initialize REPL: {}", e))?;
    if let Some(path) = watch {
        repl.watch(&path.to_string_lossy());
    }
    repl.run()
}
