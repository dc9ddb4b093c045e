use clap::{ArgAction, Parser, Subcommand};

use super::commands::{evaluate::EvaluateArgs, schema::SchemaArgs, score::ScoreArgs};

#[derive(Debug, Parser)]
#[command(
    name = "galois-eval",
    version,
    about = "GALOIS metrics for query result sets, per dataset"
)]
pub struct Cli {
    /// Raise log verbosity on stderr (`-v` info, `-vv` debug). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score every dataset under a ground-truth root against a submissions root.
    Evaluate(EvaluateArgs),
    /// Score a single ground-truth / submission file pair.
    Score(ScoreArgs),
    /// Print the JSON Schema of one `--format json` scorecard record.
    Schema(SchemaArgs),
}
