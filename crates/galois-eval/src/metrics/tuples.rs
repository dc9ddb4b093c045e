//! Row-level metrics. Rows are normalized cell by cell and counted as a
//! multiset keyed by the full tuple, so column order inside a row matters
//! and row order does not.

use std::collections::HashMap;

use crate::metrics::{CellNormalizer, MetricCache, SimilarityCache, emptiness_score};
use crate::models::Table;

pub type RowHistogram = HashMap<Vec<String>, usize>;

#[must_use]
pub fn row_histogram(table: &Table, normalizer: &mut CellNormalizer) -> RowHistogram {
    let mut histogram = RowHistogram::new();
    for row in table.rows() {
        *histogram.entry(normalizer.normalize_row(row)).or_default() += 1;
    }
    histogram
}

/// `min(|E|, |P|) / max(|E|, |P|)` over row counts.
#[must_use]
pub fn cardinality(expected: &Table, predicted: &Table) -> f64 {
    cardinality_ratio(expected.row_count(), predicted.row_count())
}

#[must_use]
pub fn cardinality_ratio(expected_rows: usize, predicted_rows: usize) -> f64 {
    if let Some(score) = emptiness_score(expected_rows, predicted_rows) {
        return score;
    }
    expected_rows.min(predicted_rows) as f64 / expected_rows.max(predicted_rows) as f64
}

/// Fraction of distinct expected rows present in the prediction with exactly
/// the same multiplicity. Having more copies than expected is a miss.
pub fn tuple_constraint(
    expected: &Table,
    predicted: &Table,
    normalizer: &mut CellNormalizer,
) -> f64 {
    let expected = row_histogram(expected, normalizer);
    let predicted = row_histogram(predicted, normalizer);
    if let Some(score) = emptiness_score(expected.len(), predicted.len()) {
        return score;
    }

    let matched = expected
        .iter()
        .filter(|(row, count)| predicted.get(*row) == Some(*count))
        .count();
    matched as f64 / expected.len() as f64
}

/// Fuzzy variant of [`tuple_constraint`]: an expected row is satisfied by any
/// distinct predicted row of the same length and multiplicity whose cells are
/// pairwise similar.
pub fn tuple_similarity_constraint(
    expected: &Table,
    predicted: &Table,
    cache: &mut MetricCache,
) -> f64 {
    let expected = row_histogram(expected, &mut cache.normalizer);
    let predicted = row_histogram(predicted, &mut cache.normalizer);
    if let Some(score) = emptiness_score(expected.len(), predicted.len()) {
        return score;
    }

    // Only rows sharing (length, multiplicity) can ever match.
    let mut buckets: HashMap<(usize, usize), Vec<&[String]>> = HashMap::new();
    for (row, count) in &predicted {
        buckets
            .entry((row.len(), *count))
            .or_default()
            .push(row.as_slice());
    }

    let similarity = &mut cache.similarity;
    let matched = expected
        .iter()
        .filter(|(row, count)| {
            buckets
                .get(&(row.len(), **count))
                .is_some_and(|candidates| {
                    candidates
                        .iter()
                        .any(|candidate| rows_similar(row, candidate, similarity))
                })
        })
        .count();
    matched as f64 / expected.len() as f64
}

fn rows_similar(expected: &[String], actual: &[String], similarity: &mut SimilarityCache) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(expected, actual)| similarity.similar(expected, actual))
}
