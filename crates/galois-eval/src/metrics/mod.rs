pub mod cells;
pub mod normalize;
pub mod similarity;
pub mod tuples;

pub use cells::{cell_set, f1_cell_exact, f1_cell_similarity};
pub use normalize::{CellNormalizer, normalize_str, normalize_value};
pub use similarity::{SimilarityCache, cells_similar, edit_distance};
pub use tuples::{cardinality, tuple_constraint, tuple_similarity_constraint};

use crate::config::{CellMetric, MetricSelection, TupleMetric};
use crate::models::{QueryResult, QueryScore, Table};

/// Memo tables for one scoring task. Never shared between workers.
#[derive(Debug, Default)]
pub struct MetricCache {
    pub normalizer: CellNormalizer,
    pub similarity: SimilarityCache,
}

impl MetricCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scores one submission against its ground truth with the selected cell and
/// tuple metrics. Cost metadata is carried over from the submission.
pub fn score_query(
    expected: &Table,
    submission: &QueryResult,
    metrics: MetricSelection,
    cache: &mut MetricCache,
) -> QueryScore {
    let predicted = &submission.table;
    let cell_f1 = match metrics.cell {
        CellMetric::Exact => f1_cell_exact(expected, predicted, &mut cache.normalizer),
        CellMetric::Similarity => f1_cell_similarity(expected, predicted, cache),
    };
    let cardinality = cardinality(expected, predicted);
    let tuple_constraint = match metrics.tuple {
        TupleMetric::Constraint => tuple_constraint(expected, predicted, &mut cache.normalizer),
        TupleMetric::Similarity => tuple_similarity_constraint(expected, predicted, cache),
    };

    QueryScore::new(
        cell_f1,
        cardinality,
        tuple_constraint,
        submission.tokens,
        submission.time_seconds,
    )
}

/// Shared rule for every metric: two empty sides agree perfectly, one empty
/// side scores zero.
pub(crate) fn emptiness_score(expected_len: usize, predicted_len: usize) -> Option<f64> {
    match (expected_len, predicted_len) {
        (0, 0) => Some(1.0),
        (0, _) | (_, 0) => Some(0.0),
        _ => None,
    }
}
