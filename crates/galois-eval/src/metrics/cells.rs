//! Cell-set F1: every value of every row, row and column identity discarded.

use std::collections::HashSet;

use crate::metrics::{CellNormalizer, MetricCache, emptiness_score};
use crate::models::Table;

#[must_use]
pub fn cell_set(table: &Table, normalizer: &mut CellNormalizer) -> HashSet<String> {
    table
        .rows()
        .iter()
        .flatten()
        .map(|value| normalizer.normalize(value))
        .collect()
}

pub fn f1_cell_exact(expected: &Table, predicted: &Table, normalizer: &mut CellNormalizer) -> f64 {
    let expected = cell_set(expected, normalizer);
    let predicted = cell_set(predicted, normalizer);
    if let Some(score) = emptiness_score(expected.len(), predicted.len()) {
        return score;
    }

    let overlap = expected.intersection(&predicted).count() as f64;
    f1(
        overlap / predicted.len() as f64,
        overlap / expected.len() as f64,
    )
}

/// Precision counts predicted values similar to at least one expected value;
/// recall counts expected values similar to at least one predicted value. A
/// single value may cover several on the other side.
pub fn f1_cell_similarity(expected: &Table, predicted: &Table, cache: &mut MetricCache) -> f64 {
    let expected: Vec<String> = cell_set(expected, &mut cache.normalizer)
        .into_iter()
        .collect();
    let predicted: Vec<String> = cell_set(predicted, &mut cache.normalizer)
        .into_iter()
        .collect();
    if let Some(score) = emptiness_score(expected.len(), predicted.len()) {
        return score;
    }

    let similarity = &mut cache.similarity;
    let precision_hits = predicted
        .iter()
        .filter(|actual| {
            expected
                .iter()
                .any(|expected_value| similarity.similar(expected_value, actual))
        })
        .count();
    let recall_hits = expected
        .iter()
        .filter(|expected_value| {
            predicted
                .iter()
                .any(|actual| similarity.similar(expected_value, actual))
        })
        .count();

    f1(
        precision_hits as f64 / predicted.len() as f64,
        recall_hits as f64 / expected.len() as f64,
    )
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{cell_set, f1_cell_exact, f1_cell_similarity};
    use crate::metrics::{CellNormalizer, MetricCache};
    use crate::models::Table;

    fn table(rows: &[&[&str]]) -> Table {
        let width = rows.first().map_or(0, |row| row.len());
        Table::new(
            (0..width).map(|index| format!("c{index}")).collect(),
            rows.iter()
                .map(|row| row.iter().map(|value| json!(value)).collect())
                .collect(),
        )
    }

    #[test]
    fn cell_set_ignores_structure_and_duplicates() {
        let set = cell_set(
            &table(&[&["Alien", "1,979"], &["alien ", "1979"]]),
            &mut CellNormalizer::new(),
        );
        assert_eq!(set.len(), 2);
        assert!(set.contains("alien"));
        assert!(set.contains("1979"));
    }

    #[test]
    fn exact_f1_edge_cases() {
        let mut normalizer = CellNormalizer::new();
        let empty = Table::empty();
        let some = table(&[&["a"]]);

        assert_eq!(f1_cell_exact(&empty, &empty, &mut normalizer), 1.0);
        assert_eq!(f1_cell_exact(&some, &empty, &mut normalizer), 0.0);
        assert_eq!(f1_cell_exact(&empty, &some, &mut normalizer), 0.0);
        assert_eq!(
            f1_cell_exact(&some, &table(&[&["b"]]), &mut normalizer),
            0.0
        );
    }

    #[test]
    fn exact_f1_is_harmonic_mean_of_set_overlap() {
        let expected = table(&[&["a", "b"], &["c", "d"]]);
        let predicted = table(&[&["a", "b"]]);

        // precision 1, recall 1/2
        let score = f1_cell_exact(&expected, &predicted, &mut CellNormalizer::new());
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn exact_f1_is_one_for_identical_sets_in_any_layout() {
        let expected = table(&[&["x", "y"], &["y", "x"]]);
        let predicted = table(&[&["Y"], &["X"], &["x"]]);
        assert_eq!(
            f1_cell_exact(&expected, &predicted, &mut CellNormalizer::new()),
            1.0
        );
    }

    #[test]
    fn similarity_f1_uses_existential_matching() {
        let expected = table(&[&["100"], &["200"]]);
        let predicted = table(&[&["101"], &["102"], &["900"]]);

        // precision 2/3 (101, 102 near 100), recall 1/2 (only 100 covered)
        let score = f1_cell_similarity(&expected, &predicted, &mut MetricCache::new());
        let expected_score = 2.0 * (2.0 / 3.0) * 0.5 / (2.0 / 3.0 + 0.5);
        assert!((score - expected_score).abs() < 1e-12);
    }

    #[test]
    fn similarity_f1_edge_cases() {
        let mut cache = MetricCache::new();
        assert_eq!(
            f1_cell_similarity(&Table::empty(), &Table::empty(), &mut cache),
            1.0
        );
        assert_eq!(
            f1_cell_similarity(&table(&[&["a"]]), &Table::empty(), &mut cache),
            0.0
        );
        assert_eq!(
            f1_cell_similarity(&table(&[&["abc"]]), &table(&[&["xyz"]]), &mut cache),
            0.0
        );
    }
}
