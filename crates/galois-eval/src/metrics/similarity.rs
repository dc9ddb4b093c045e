//! Fuzzy equality of two normalized cells.
//!
//! Numbers match within a 10% relative tolerance (or `|actual| <= 0.1` when
//! the expected value is zero). Everything else matches when the Levenshtein
//! distance is at most `floor(len(expected) * 0.1)` characters.

use std::collections::HashMap;

use crate::error::{EvalError, EvalResult};

pub const TOLERANCE: f64 = 0.10;

const SIMILARITY_CACHE_CAPACITY: usize = 500_000;

/// Reads a normalized cell as a number, accepting `,` as decimal separator.
pub fn numeric_value(cell: &str) -> EvalResult<f64> {
    cell.replace(',', ".")
        .parse::<f64>()
        .map_err(|_| EvalError::MalformedValue {
            value: cell.to_string(),
        })
}

/// Argument order matters: tolerances are relative to `expected`.
#[must_use]
pub fn cells_similar(expected: &str, actual: &str) -> bool {
    if let (Ok(expected), Ok(actual)) = (numeric_value(expected), numeric_value(actual)) {
        if expected == 0.0 {
            return actual.abs() <= TOLERANCE;
        }
        return ((expected - actual) / expected).abs() <= TOLERANCE;
    }

    let expected: Vec<char> = expected.chars().collect();
    let actual: Vec<char> = actual.chars().collect();
    let threshold = (expected.len() as f64 * TOLERANCE).floor() as usize;
    within_edit_distance(&expected, &actual, threshold)
}

#[must_use]
pub fn edit_distance(left: &str, right: &str) -> usize {
    if left == right {
        return 0;
    }
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    levenshtein(&left, &right, usize::MAX)
}

fn within_edit_distance(left: &[char], right: &[char], limit: usize) -> bool {
    if left.len().abs_diff(right.len()) > limit {
        return false;
    }
    levenshtein(left, right, limit) <= limit
}

/// Two-row dynamic program. Stops as soon as every entry of a row exceeds
/// `limit`, returning `limit + 1`; distances within the limit are exact.
fn levenshtein(left: &[char], right: &[char], limit: usize) -> usize {
    if left == right {
        return 0;
    }
    let (short, long) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    if short.is_empty() {
        return long.len();
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0_usize; short.len() + 1];
    for (j, long_char) in long.iter().enumerate() {
        current[0] = j + 1;
        let mut row_min = current[0];
        for (i, short_char) in short.iter().enumerate() {
            let substitution = previous[i] + usize::from(short_char != long_char);
            current[i + 1] = (previous[i + 1] + 1)
                .min(current[i] + 1)
                .min(substitution);
            row_min = row_min.min(current[i + 1]);
        }
        if row_min > limit {
            return limit.saturating_add(1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[short.len()]
}

/// Memoizes [`cells_similar`] keyed by `(expected, actual)`. Owned by a single
/// scoring task; cleared when it reaches capacity.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    memo: HashMap<String, HashMap<String, bool>>,
    entries: usize,
}

impl SimilarityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn similar(&mut self, expected: &str, actual: &str) -> bool {
        if let Some(hit) = self
            .memo
            .get(expected)
            .and_then(|row| row.get(actual))
            .copied()
        {
            return hit;
        }

        let similar = cells_similar(expected, actual);
        if self.entries >= SIMILARITY_CACHE_CAPACITY {
            self.memo.clear();
            self.entries = 0;
        }
        self.memo
            .entry(expected.to_string())
            .or_default()
            .insert(actual.to_string(), similar);
        self.entries += 1;
        similar
    }
}
