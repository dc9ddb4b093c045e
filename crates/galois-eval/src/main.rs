#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use galois_eval::cli::app::{Cli, Command};
use galois_eval::cli::commands;
use galois_eval::config::EvalPaths;
use galois_eval::eval::NoDatasetsFound;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_NO_DATASETS: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    init_tracing(cli.verbose);
    let command_name = command_name(&cli.command);
    tracing::debug!("galois-eval: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            let exit_code = classify_runtime_error(&error);
            eprintln!("galois-eval: failed `{command_name}` (exit_code={exit_code})");
            eprintln!("{error:#}");
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Evaluate(args) => {
            let paths = resolve_eval_paths(&args.ground, &args.submissions)?;
            commands::evaluate::run(&args, &paths)
        }
        Command::Score(args) => commands::score::run(&args),
        Command::Schema(args) => commands::schema::run(&args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn classify_runtime_error(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<NoDatasetsFound>().is_some() {
        EXIT_NO_DATASETS
    } else {
        EXIT_RUNTIME_FAILURE
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Evaluate(_) => "evaluate",
        Command::Score(_) => "score",
        Command::Schema(_) => "schema",
    }
}

fn resolve_eval_paths(ground: &Path, submissions: &Path) -> Result<EvalPaths> {
    let home_dir = std::env::var_os("HOME").map(PathBuf::from);
    let cwd = std::env::current_dir()?;
    galois_eval::config::resolve_eval_paths(ground, submissions, home_dir.as_deref(), &cwd)
}
