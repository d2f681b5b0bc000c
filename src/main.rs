use clap::Parser;
use infinite_sounds::cli::{validate, Cli};
use infinite_sounds::printer::format_error;
use infinite_sounds::repl;
use std::process;

fn run(cli: &Cli) -> anyhow::Result<()> {
    validate(cli)?;
    if cli.interactive() {
        return repl::start(cli.context()?, cli.watch.as_deref());
    }
    if let Some(source) = cli.source()? {
        println!("{}", cli.run(&source)?);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{}", format_error(format!("{:#}", e)));
        process::exit(1);
    }
}
