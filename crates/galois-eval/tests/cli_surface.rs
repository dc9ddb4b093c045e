use std::path::Path;

use clap::Parser;
use galois_eval::cli::app::{Cli, Command};
use galois_eval::config::{CellMetric, TupleMetric};
use galois_eval::render::OutputFormat;

#[test]
fn evaluate_defaults_match_documented_values() {
    let cli = Cli::parse_from([
        "galois-eval",
        "evaluate",
        "--ground",
        "data/ground",
        "--submissions",
        "runs/latest",
    ]);

    assert_eq!(cli.verbose, 0);
    match cli.command {
        Command::Evaluate(args) => {
            assert_eq!(args.ground, Path::new("data/ground"));
            assert_eq!(args.submissions, Path::new("runs/latest"));
            assert_eq!(args.cell_metric, CellMetric::Exact);
            assert_eq!(args.tuple_metric, TupleMetric::Constraint);
            assert_eq!(args.format, OutputFormat::Table);
            assert_eq!(args.jobs, 6);
            assert_eq!(args.jobs_queries, 6);
            assert!(!args.overall);
            assert!(args.plan().datasets.is_none());
        }
        other => panic!("expected evaluate command, got {other:?}"),
    }
}

#[test]
fn evaluate_accepts_every_option() {
    let cli = Cli::parse_from([
        "galois-eval",
        "-vv",
        "evaluate",
        "--ground",
        "g",
        "--submissions",
        "s",
        "--datasets",
        "GEO",
        "MOVIES",
        "--cell-metric",
        "similarity",
        "--tuple-metric",
        "similarity",
        "--format",
        "tex",
        "--overall",
        "--jobs",
        "1",
        "--jobs-queries",
        "3",
        "--latex-caption",
        "Results",
        "--latex-label",
        "tab:results",
        "--latex-booktabs",
    ]);

    assert_eq!(cli.verbose, 2);
    match cli.command {
        Command::Evaluate(args) => {
            let plan = args.plan();
            assert_eq!(plan.metrics.cell, CellMetric::Similarity);
            assert_eq!(plan.metrics.tuple, TupleMetric::Similarity);
            assert_eq!(plan.jobs, 1);
            assert_eq!(plan.jobs_queries, 3);
            assert!(plan.allows("GEO"));
            assert!(plan.allows("MOVIES"));
            assert!(!plan.allows("SPIDER"));
            assert_eq!(args.format, OutputFormat::Tex);
            assert!(args.overall);

            let latex = args.latex_options();
            assert_eq!(latex.caption.as_deref(), Some("Results"));
            assert_eq!(latex.label.as_deref(), Some("tab:results"));
            assert!(latex.booktabs);
        }
        other => panic!("expected evaluate command, got {other:?}"),
    }
}

#[test]
fn bare_datasets_flag_means_all_datasets() {
    let cli = Cli::parse_from([
        "galois-eval",
        "evaluate",
        "--ground",
        "g",
        "--submissions",
        "s",
        "--datasets",
    ]);

    match cli.command {
        Command::Evaluate(args) => assert!(args.plan().datasets.is_none()),
        other => panic!("expected evaluate command, got {other:?}"),
    }
}

#[test]
fn rejects_unknown_metric_and_zero_workers() {
    let unknown = Cli::try_parse_from([
        "galois-eval",
        "evaluate",
        "--ground",
        "g",
        "--submissions",
        "s",
        "--cell-metric",
        "fuzzy",
    ]);
    assert!(unknown.is_err());

    let zero = Cli::try_parse_from([
        "galois-eval",
        "evaluate",
        "--ground",
        "g",
        "--submissions",
        "s",
        "--jobs-queries",
        "0",
    ]);
    assert!(zero.is_err());
}

#[test]
fn parses_score_command() {
    let cli = Cli::parse_from([
        "galois-eval",
        "score",
        "--ground-file",
        "Q1.csv",
        "--submission-file",
        "Q1.json",
        "--tuple-metric",
        "similarity",
        "--json",
    ]);

    match cli.command {
        Command::Score(args) => {
            assert_eq!(args.ground_file, Path::new("Q1.csv"));
            assert_eq!(args.submission_file, Path::new("Q1.json"));
            assert_eq!(args.cell_metric, CellMetric::Exact);
            assert_eq!(args.tuple_metric, TupleMetric::Similarity);
            assert!(args.json);
        }
        other => panic!("expected score command, got {other:?}"),
    }
}
