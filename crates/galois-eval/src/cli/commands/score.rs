use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::config::{CellMetric, MetricSelection, TupleMetric};
use crate::metrics::{MetricCache, score_query};
use crate::models::QueryScore;
use crate::reader::{read_submission_file, read_table_file};
use crate::render::{format_metric, format_time, format_tokens};

#[derive(Debug, Clone, Args)]
pub struct ScoreArgs {
    #[arg(long, value_name = "FILE")]
    pub ground_file: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub submission_file: PathBuf,

    #[arg(long, value_enum, default_value_t = CellMetric::Exact)]
    pub cell_metric: CellMetric,

    #[arg(long, value_enum, default_value_t = TupleMetric::Constraint)]
    pub tuple_metric: TupleMetric,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &ScoreArgs) -> Result<()> {
    if !args.submission_file.is_file() {
        bail!(
            "submission file does not exist: {}",
            args.submission_file.display()
        );
    }

    let expected = read_table_file(&args.ground_file)?;
    let submission = read_submission_file(Some(&args.submission_file))?;
    let metrics = MetricSelection {
        cell: args.cell_metric,
        tuple: args.tuple_metric,
    };
    let score = score_query(&expected, &submission, metrics, &mut MetricCache::new());

    if args.json {
        let encoded =
            serde_json::to_string_pretty(&score).context("failed to serialize query score")?;
        println!("{encoded}");
    } else {
        print!("{}", score_lines(&score));
    }

    Ok(())
}

#[must_use]
pub fn score_lines(score: &QueryScore) -> String {
    format!(
        "cell_f1: {}\ncardinality: {}\ntuple_constraint: {}\naverage: {}\n\
         tokens: {}\ntime_seconds: {}\n",
        format_metric(score.cell_f1),
        format_metric(score.cardinality),
        format_metric(score.tuple_constraint),
        format_metric(score.average),
        format_tokens(score.tokens),
        format_time(score.time_seconds),
    )
}
