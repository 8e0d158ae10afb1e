//! minigo compiler driver
//!
//! Front door for the pipeline: parse, check, then either interpret or
//! emit bytecode.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser as CliParser;
use log::info;

use minigo::backend::{CodeGen, Interpreter};
use minigo::frontend::{Lexer, Parser};
use minigo::sema::{ast, SemanticChecker};

/// minigo compiler
#[derive(CliParser, Debug)]
#[command(name = "minigoc")]
#[command(version = "0.1.0")]
#[command(about = "Compiler and interpreter for a small Go-like language")]
struct Cli {
    /// Input source file (.go)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Run the program in the tree-walking interpreter instead of
    /// emitting bytecode
    #[arg(short, long)]
    interpret: bool,

    /// Print the typed AST in graphviz DOT format
    #[arg(long)]
    emit_dot: bool,

    /// Print the string, variable and function tables
    #[arg(long)]
    dump_tables: bool,

    /// Report semantic diagnostics as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Output file for the generated bytecode (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    info!("compiling {}", cli.input.display());

    let tokens = Lexer::new(&source).tokenize()?;
    let program = Parser::new(tokens).parse_program()?;
    let checked = SemanticChecker::new().check(&program);

    if cli.dump_tables {
        print!("{}", checked.strings);
        print!("{}", checked.vars);
        print!("{}", checked.funcs);
    }
    if cli.emit_dot {
        print!("{}", ast::render_dot(&checked.ast, &checked.vars));
    }

    if !checked.passed() {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&checked.diagnostics)?);
        } else {
            for diag in &checked.diagnostics {
                eprintln!("{}", diag);
            }
        }
        return Ok(1);
    }

    if cli.interpret {
        let stdin = io::stdin();
        let stdout = io::stdout();
        Interpreter::new(&checked, stdin.lock(), stdout.lock()).run()?;
        return Ok(0);
    }

    let bytecode = CodeGen::generate(&checked)?;
    match &cli.output {
        Some(path) => fs::write(path, bytecode.to_string())
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", bytecode),
    }
    Ok(0)
}
