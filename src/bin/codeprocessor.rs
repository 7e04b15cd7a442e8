//! CLI wrapper for the code processor.
//!
//! Usage:
//!   codeprocessor [-v] [-c key=value]... [-u name]... <file.js>
//!
//! Prints the results of the run as JSON on stdout. The exit code is 0 when the program
//! completed normally, 1 on an uncaught exception and 2 on a fatal error.

use std::env;
use std::fs;
use std::process;

use codeprocessor::runner::api::CodeProcessor;
use codeprocessor::runner::ds::error::FatalError;
use codeprocessor::runner::runtime::RuntimeOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

struct CliArgs {
    verbose: bool,
    config: Vec<String>,
    unknown_globals: Vec<String>,
    file: String,
}

fn main() {
    let args = match parse_args(env::args().skip(1)) {
        Some(args) => args,
        None => {
            print_usage();
            process::exit(2);
        }
    };
    init_tracing(args.verbose);
    process::exit(run(args));
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<CliArgs> {
    let mut verbose = false;
    let mut config = vec![];
    let mut unknown_globals = vec![];
    let mut file = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return None,
            "-v" | "--verbose" => verbose = true,
            "-c" | "--config" => config.push(args.next()?),
            "-u" | "--unknown-global" => unknown_globals.push(args.next()?),
            _ if file.is_none() && !arg.starts_with('-') => file = Some(arg),
            _ => return None,
        }
    }
    Some(CliArgs {
        verbose,
        config,
        unknown_globals,
        file: file?,
    })
}

fn print_usage() {
    eprintln!("codeprocessor - static processing of ECMAScript 5 programs");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  codeprocessor [options] <file.js>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config key=value       Set a runtime option, e.g. maxLoopIterations=100");
    eprintln!("  -u, --unknown-global name    Bind a global to an unknown value");
    eprintln!("  -v, --verbose                Log rule processing (overridden by RUST_LOG)");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "codeprocessor=debug" } else { "codeprocessor=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run(args: CliArgs) -> i32 {
    match process_file(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            2
        }
    }
}

fn process_file(args: &CliArgs) -> Result<i32, FatalError> {
    let options = RuntimeOptions::from_pairs(&args.config)?;
    let source = fs::read_to_string(&args.file).map_err(|e| {
        FatalError::InvalidConfig(format!("cannot read '{}': {}", args.file, e))
    })?;
    let mut processor = CodeProcessor::new(options)?;
    for name in &args.unknown_globals {
        processor.define_unknown_global(name.as_str());
    }
    let results = processor.process_source(&args.file, &source)?;
    match serde_json::to_string_pretty(&results) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Cannot serialise results: {}", e),
    }
    Ok(if results.is_normal() { 0 } else { 1 })
}
