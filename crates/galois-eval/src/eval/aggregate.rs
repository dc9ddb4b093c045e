//! Folds query scores into dataset scorecards and dataset scorecards into the
//! cross-dataset `ALL` row.
//!
//! Token and time fields are strict: one missing value at the finer level
//! blanks the coarser field instead of aggregating partial data.

use crate::models::{QueryScore, Scorecard};

/// Arithmetic mean of every metric; tokens are summed and times averaged.
/// A dataset without queries reports zeros and blank tokens/time.
#[must_use]
pub fn fold_dataset(scores: &[QueryScore]) -> Scorecard {
    if scores.is_empty() {
        return Scorecard::blank();
    }

    let count = scores.len() as f64;
    let mean = |metric: fn(&QueryScore) -> f64| scores.iter().map(metric).sum::<f64>() / count;
    let tokens = scores
        .iter()
        .map(|score| score.tokens)
        .sum::<Option<f64>>();
    let avg_time_seconds = scores
        .iter()
        .map(|score| score.time_seconds)
        .sum::<Option<f64>>()
        .map(|total| total / count);

    Scorecard {
        cell_f1: mean(|score| score.cell_f1),
        cardinality: mean(|score| score.cardinality),
        tuple_constraint: mean(|score| score.tuple_constraint),
        average: mean(|score| score.average),
        queries: scores.len(),
        tokens,
        avg_time_seconds,
    }
}

/// Query-count-weighted mean across datasets.
///
/// Tokens are blank unless every dataset reported tokens. Time is the
/// weighted mean of per-dataset averages, blank unless every dataset has at
/// least one query and a reported time.
#[must_use]
pub fn fold_overall(datasets: &[Scorecard]) -> Scorecard {
    let total_queries: usize = datasets.iter().map(|card| card.queries).sum();
    if total_queries == 0 {
        return Scorecard::blank();
    }

    let total = total_queries as f64;
    let weighted = |metric: fn(&Scorecard) -> f64| {
        datasets
            .iter()
            .map(|card| metric(card) * card.queries as f64)
            .sum::<f64>()
            / total
    };
    let tokens = datasets
        .iter()
        .map(|card| card.tokens)
        .sum::<Option<f64>>();
    let avg_time_seconds = datasets
        .iter()
        .map(|card| {
            card.avg_time_seconds
                .filter(|_| card.queries > 0)
                .map(|time| time * card.queries as f64)
        })
        .sum::<Option<f64>>()
        .map(|weighted_time| weighted_time / total);

    Scorecard {
        cell_f1: weighted(|card| card.cell_f1),
        cardinality: weighted(|card| card.cardinality),
        tuple_constraint: weighted(|card| card.tuple_constraint),
        average: weighted(|card| card.average),
        queries: total_queries,
        tokens,
        avg_time_seconds,
    }
}
