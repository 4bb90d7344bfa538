//! corten-jsc
//!
//! Compiles JavaScript source and prints the bytecode listing.

use clap::Parser as ClapParser;
use js_cli::logging::init_tracing;
use js_cli::repl::run_repl;
use js_cli::{Cli, CliResult, Session};

fn run(cli: Cli) -> CliResult<()> {
    let mut session = Session::from_cli(&cli);
    if let Some(file) = cli.file.as_deref() {
        let code = session.compile_file(file)?;
        println!("{}", session.render(&code)?);
    } else if let Some(source) = cli.eval.as_deref() {
        let code = session.compile_source(source)?;
        println!("{}", session.render(&code)?);
    } else if cli.repl {
        run_repl(&mut session)?;
    } else {
        println!("corten-jsc {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage:");
        println!("  corten-jsc --file <FILE>     Compile a JavaScript file");
        println!("  corten-jsc --eval <CODE>     Compile inline source");
        println!("  corten-jsc --repl            Start an interactive session");
        println!();
        println!("Run 'corten-jsc --help' for more options.");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    if let Err(err) = run(cli) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
