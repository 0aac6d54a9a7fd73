use std::fs;

use anyhow::{Context, Result, bail};

use crate::runner::LogOptions;

mod ast;
mod interpreter;
mod lexer;
mod natives;
mod parser;
mod runner;
mod scope;
mod semantics;
mod symbol;
mod token;

fn main() -> Result<()> {
    let mut options = LogOptions::default();
    let mut input_path: Option<String> = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--scope" => options.scope = true,
            "--stack" => options.stack = true,
            "--tokens" => options.tokens = true,
            "--internal-errors" => options.internal_errors = true,
            flag if flag.starts_with('-') => bail!("Unknown flag '{flag}'"),
            _ => {
                if input_path.is_some() {
                    bail!("Only one input file is supported");
                }
                input_path = Some(arg);
            }
        }
    }

    let path = input_path.context("No input file provided")?;
    let source = fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?;

    match runner::run(&source, options) {
        runner::ExitOutcome::Success(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        failure => {
            eprintln!("{}", failure.message());
            std::process::exit(failure.exit_code());
        }
    }
}
