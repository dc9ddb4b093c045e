//! Walks the ground-truth tree, pairs every query with its submission and
//! scores datasets on the worker pool.

pub mod aggregate;
pub mod pool;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{EvalPaths, EvalPlan, MetricSelection};
use crate::metrics::{MetricCache, score_query};
use crate::models::{DatasetScorecard, QueryFailure, QueryResult, QueryScore, Scorecard};
use crate::reader::{ResultFormat, read_submission_file, read_table_file};
use pool::WorkerPool;

pub use aggregate::{fold_dataset, fold_overall};

/// Raised when the ground-truth root holds no (allowed) dataset directory.
#[derive(Debug, Error)]
#[error("no datasets found under {}", root.display())]
pub struct NoDatasetsFound {
    pub root: PathBuf,
}

/// Outcome of scoring one query, including why it was degraded if it was.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query: String,
    pub score: QueryScore,
    pub failure: Option<QueryFailure>,
}

/// Evaluates every allowed dataset under the ground-truth root. Results are
/// sorted by dataset name.
pub fn evaluate_all(paths: &EvalPaths, plan: &EvalPlan) -> Result<Vec<DatasetScorecard>> {
    let ground = discover_datasets(&paths.ground_root, plan)?;
    if ground.is_empty() {
        return Err(NoDatasetsFound {
            root: paths.ground_root.clone(),
        }
        .into());
    }

    let submissions = if paths.submissions_root.is_dir() {
        discover_datasets(&paths.submissions_root, plan)?
    } else {
        warn!(
            root = %paths.submissions_root.display(),
            "submissions root does not exist; every dataset scores as missing"
        );
        BTreeMap::new()
    };

    let jobs: Vec<(String, PathBuf, Option<PathBuf>)> = ground
        .into_iter()
        .map(|(name, ground_dir)| {
            let submission_dir = submissions.get(&name).cloned();
            (name, ground_dir, submission_dir)
        })
        .collect();

    let dataset_pool = WorkerPool::new(plan.jobs, "dataset")?;
    let query_pool = WorkerPool::new(plan.jobs_queries, "query")?;
    debug!(
        dataset_workers = dataset_pool.workers(),
        query_workers = query_pool.workers(),
        "worker pools ready"
    );
    let mut datasets = dataset_pool
        .run(jobs, |(name, ground_dir, submission_dir)| {
            evaluate_dataset(&name, &ground_dir, submission_dir.as_deref(), plan, &query_pool)
        })
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    datasets.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(datasets)
}

/// The cross-dataset `ALL` row.
#[must_use]
pub fn overall_scorecard(datasets: &[DatasetScorecard]) -> Scorecard {
    let cards: Vec<Scorecard> = datasets.iter().map(|dataset| dataset.scorecard).collect();
    fold_overall(&cards)
}

/// Immediate subdirectories of `root`, keyed by name and filtered by the
/// plan's allow-list.
pub fn discover_datasets(root: &Path, plan: &EvalPlan) -> Result<BTreeMap<String, PathBuf>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("failed to list datasets in {}", root.display()))?;

    let mut datasets = BTreeMap::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if plan.allows(name) {
            datasets.insert(name.to_string(), path.clone());
        }
    }

    Ok(datasets)
}

/// Ground-truth files in a dataset directory keyed by query id (file stem).
///
/// When a stem exists with both extensions the lexicographically last path
/// wins, so `Q1.json` shadows `Q1.csv`.
pub fn discover_queries(dataset_dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let entries = std::fs::read_dir(dataset_dir)
        .with_context(|| format!("failed to list queries in {}", dataset_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dataset_dir.display()))?;
        let path = entry.path();
        if path.is_file() && ResultFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();

    let mut queries = BTreeMap::new();
    for path in files {
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            queries.insert(stem.to_string(), path.clone());
        }
    }

    Ok(queries)
}

/// Finds the submission for `query_id`: first with the ground truth's own
/// extension, then with the alternate format's.
#[must_use]
pub fn locate_submission(
    submission_dir: &Path,
    query_id: &str,
    ground_truth: &Path,
) -> Option<PathBuf> {
    if let Some(extension) = ground_truth.extension().and_then(|ext| ext.to_str()) {
        let same = submission_dir.join(format!("{query_id}.{extension}"));
        if same.is_file() {
            return Some(same);
        }
    }

    let format = ResultFormat::from_path(ground_truth)?;
    let alternate = submission_dir.join(format!("{query_id}.{}", format.alternate().extension()));
    alternate.is_file().then_some(alternate)
}

/// Scores one dataset, running its queries on `queries`. A dataset absent
/// from the submissions root reports zeros with no queries counted.
#[instrument(level = "info", skip_all, fields(dataset = %name))]
pub fn evaluate_dataset(
    name: &str,
    ground_dir: &Path,
    submission_dir: Option<&Path>,
    plan: &EvalPlan,
    queries: &WorkerPool,
) -> Result<DatasetScorecard> {
    let Some(submission_dir) = submission_dir else {
        warn!("dataset has no submissions directory");
        return Ok(DatasetScorecard {
            name: name.to_string(),
            scorecard: Scorecard::blank(),
            failures: Vec::new(),
        });
    };

    let query_files: Vec<(String, PathBuf)> = discover_queries(ground_dir)?.into_iter().collect();
    let metrics = plan.metrics;

    let outcomes = queries.run(query_files, |(query_id, ground_truth)| {
        let submission = locate_submission(submission_dir, &query_id, &ground_truth);
        evaluate_query(&query_id, &ground_truth, submission.as_deref(), metrics)
    });

    let scores: Vec<QueryScore> = outcomes.iter().map(|outcome| outcome.score).collect();
    let failures: Vec<QueryFailure> = outcomes
        .into_iter()
        .filter_map(|outcome| outcome.failure)
        .collect();
    let scorecard = fold_dataset(&scores);

    info!(
        queries = scorecard.queries,
        failures = failures.len(),
        avg_score = scorecard.average,
        "dataset evaluated"
    );

    Ok(DatasetScorecard {
        name: name.to_string(),
        scorecard,
        failures,
    })
}

/// Scores one query with its own metric caches.
///
/// An unreadable ground truth scores zero across the board; an unreadable
/// submission is scored as an empty result. Both are reported as failures.
pub fn evaluate_query(
    query_id: &str,
    ground_truth: &Path,
    submission: Option<&Path>,
    metrics: MetricSelection,
) -> QueryOutcome {
    let expected = match read_table_file(ground_truth) {
        Ok(table) => table,
        Err(error) => {
            warn!(query = query_id, %error, "ground truth unreadable; scoring zero");
            return QueryOutcome {
                query: query_id.to_string(),
                score: QueryScore::zero(),
                failure: Some(QueryFailure {
                    query: query_id.to_string(),
                    detail: error.to_string(),
                }),
            };
        }
    };

    let mut failure = None;
    let submission = match read_submission_file(submission) {
        Ok(result) => result,
        Err(error) => {
            warn!(query = query_id, %error, "submission unreadable; scoring as empty");
            failure = Some(QueryFailure {
                query: query_id.to_string(),
                detail: error.to_string(),
            });
            QueryResult::empty()
        }
    };

    let mut cache = MetricCache::new();
    let score = score_query(&expected, &submission, metrics, &mut cache);
    debug!(
        query = query_id,
        cell_f1 = score.cell_f1,
        cardinality = score.cardinality,
        tuple_constraint = score.tuple_constraint,
        "query scored"
    );

    QueryOutcome {
        query: query_id.to_string(),
        score,
        failure,
    }
}
