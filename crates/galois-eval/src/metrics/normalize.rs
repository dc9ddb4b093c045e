//! Canonical string form of a cell, used by every comparison.
//!
//! Rules, first match wins, applied to the printed value with thousands
//! separators removed:
//! 1. `<number> million|m` → ×1e6, `<number> billion|b` → ×1e9,
//!    `<number> thousand|k` → ×1e3, printed with no decimals.
//! 2. A plain number (`-?digits(.digits)?`) → integers with no decimal point,
//!    decimals with exactly two digits after the point.
//! 3. Anything else → newlines removed, trimmed, lowercased. This branch
//!    works on the unstripped text, commas included.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::render_cell;

const NORMALIZE_CACHE_CAPACITY: usize = 200_000;

#[must_use]
pub fn normalize_value(value: &Value) -> String {
    normalize_str(&render_cell(value))
}

#[must_use]
pub fn normalize_str(cell: &str) -> String {
    let stripped = cell.replace(',', "");

    for (regex, factor) in magnitude_rules() {
        if let Some(captures) = regex.captures(&stripped)
            && let Ok(number) = captures[1].parse::<f64>()
        {
            return format!("{:.0}", number * factor);
        }
    }

    let trimmed = stripped.trim();
    if plain_number_regex().is_match(trimmed)
        && let Ok(number) = trimmed.parse::<f64>()
    {
        return if trimmed.contains('.') {
            format!("{number:.2}")
        } else {
            format!("{number:.0}")
        };
    }

    cell.replace('\n', "").trim().to_lowercase()
}

/// Memoizes [`normalize_value`] by printed form. Owned by a single scoring
/// task; the table is cleared when it reaches capacity.
#[derive(Debug, Default)]
pub struct CellNormalizer {
    memo: HashMap<String, String>,
}

impl CellNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, value: &Value) -> String {
        let printed = render_cell(value);
        if let Some(hit) = self.memo.get(printed.as_ref()) {
            return hit.clone();
        }

        let normalized = normalize_str(&printed);
        if self.memo.len() >= NORMALIZE_CACHE_CAPACITY {
            self.memo.clear();
        }
        self.memo.insert(printed.into_owned(), normalized.clone());
        normalized
    }

    pub fn normalize_row(&mut self, row: &[Value]) -> Vec<String> {
        row.iter().map(|value| self.normalize(value)).collect()
    }
}

fn magnitude_rules() -> &'static [(Regex, f64)] {
    static RULES: OnceLock<Vec<(Regex, f64)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)(\d+(?:\.\d+)?)\s*(million|m)\b", 1_000_000.0),
            (r"(?i)(\d+(?:\.\d+)?)\s*(billion|b)\b", 1_000_000_000.0),
            (r"(?i)(\d+(?:\.\d+)?)\s*(thousand|k)\b", 1_000.0),
        ]
        .into_iter()
        .map(|(pattern, factor)| {
            (
                Regex::new(pattern).expect("magnitude regex should compile"),
                factor,
            )
        })
        .collect()
    })
}

fn plain_number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric regex should compile"))
}
