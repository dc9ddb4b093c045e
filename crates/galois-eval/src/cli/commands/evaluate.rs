use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::{CellMetric, DEFAULT_JOBS, EvalPaths, EvalPlan, MetricSelection, TupleMetric};
use crate::render::{LatexOptions, OutputFormat, render_report, report_rows};

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    /// Ground-truth root: one subdirectory per dataset.
    #[arg(long, value_name = "DIR")]
    pub ground: PathBuf,

    /// Submissions root mirroring the ground-truth layout.
    #[arg(long, value_name = "DIR")]
    pub submissions: PathBuf,

    /// Datasets to evaluate (default: all).
    #[arg(long, num_args = 0.., value_name = "NAME")]
    pub datasets: Vec<String>,

    #[arg(long, value_enum, default_value_t = CellMetric::Exact)]
    pub cell_metric: CellMetric,

    #[arg(long, value_enum, default_value_t = TupleMetric::Constraint)]
    pub tuple_metric: TupleMetric,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Print a single `ALL` row aggregated across the selected datasets.
    #[arg(long, default_value_t = false)]
    pub overall: bool,

    /// Datasets evaluated in parallel.
    #[arg(long, default_value_t = DEFAULT_JOBS, value_parser = parse_worker_count)]
    pub jobs: usize,

    /// Queries evaluated in parallel within each dataset.
    #[arg(long, default_value_t = DEFAULT_JOBS, value_parser = parse_worker_count)]
    pub jobs_queries: usize,

    #[arg(long, value_name = "TEXT")]
    pub latex_caption: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub latex_label: Option<String>,

    #[arg(long, default_value_t = false)]
    pub latex_booktabs: bool,
}

impl EvaluateArgs {
    #[must_use]
    pub fn plan(&self) -> EvalPlan {
        let datasets = (!self.datasets.is_empty())
            .then(|| self.datasets.iter().cloned().collect::<BTreeSet<_>>());
        EvalPlan {
            metrics: MetricSelection {
                cell: self.cell_metric,
                tuple: self.tuple_metric,
            },
            jobs: self.jobs,
            jobs_queries: self.jobs_queries,
            datasets,
        }
    }

    #[must_use]
    pub fn latex_options(&self) -> LatexOptions {
        LatexOptions {
            caption: self.latex_caption.clone(),
            label: self.latex_label.clone(),
            booktabs: self.latex_booktabs,
        }
    }
}

fn parse_worker_count(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("worker count must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(error) => Err(error.to_string()),
    }
}

pub fn run(args: &EvaluateArgs, paths: &EvalPaths) -> Result<()> {
    let plan = args.plan();
    info!(
        ground = %paths.ground_root.display(),
        submissions = %paths.submissions_root.display(),
        cell_metric = plan.metrics.cell.as_str(),
        tuple_metric = plan.metrics.tuple.as_str(),
        jobs = plan.jobs,
        jobs_queries = plan.jobs_queries,
        "evaluate: start"
    );

    let datasets = crate::eval::evaluate_all(paths, &plan)?;
    let failures: usize = datasets.iter().map(|dataset| dataset.failures.len()).sum();
    let rows = report_rows(&datasets, args.overall);
    let report = render_report(&rows, args.format, &args.latex_options())?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(report.as_bytes())
        .context("failed to write report to stdout")?;
    stdout.flush().context("failed to flush stdout")?;

    info!(
        datasets = datasets.len(),
        recovered_failures = failures,
        "evaluate: complete"
    );
    Ok(())
}
