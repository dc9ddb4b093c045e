use std::borrow::Cow;

use serde_json::Value;

/// A query result: ordered column names plus fixed-width rows.
///
/// Column names are not required to be unique. Every row is padded with
/// empty strings or truncated so that it has exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::String(String::new()));
                row
            })
            .collect();
        Self { columns, rows }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A parsed result file plus the optional cost metadata carried by the
/// full `{"result_set", "tokens", "time"}` envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub table: Table,
    pub tokens: Option<f64>,
    pub time_seconds: Option<f64>,
}

impl QueryResult {
    #[must_use]
    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            tokens: None,
            time_seconds: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Printed form of a cell, which is what normalization operates on.
///
/// Booleans and null print as `True`, `False` and `None`, the spelling used
/// by existing ground-truth exports. Floats use the same shortest digits as
/// `serde_json` but switch to exponent form outside `1e-4 <= |x| < 1e16`,
/// written with a sign and at least two exponent digits (`1e+20`).
#[must_use]
pub fn render_cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => Cow::Owned(float_repr(float)),
            _ => Cow::Owned(number.to_string()),
        },
        Value::Bool(true) => Cow::Borrowed("True"),
        Value::Bool(false) => Cow::Borrowed("False"),
        Value::Null => Cow::Borrowed("None"),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

fn float_repr(value: f64) -> String {
    let sign = if value.is_sign_negative() { "-" } else { "" };
    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e-5`.
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let digits = mantissa.replace('.', "");

    if !(-4..16).contains(&exponent) {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{lead}{fraction}e{exponent_sign}{:02}", exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        return format!("{sign}0.{zeros}{digits}");
    }
    let point = exponent as usize + 1;
    if digits.len() > point {
        let (whole, fraction) = digits.split_at(point);
        format!("{sign}{whole}.{fraction}")
    } else {
        format!("{sign}{digits:0<point$}.0")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{Table, render_cell};

    #[test]
    fn pads_and_truncates_rows_to_column_count() {
        let table = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![json!("1")], vec![json!("1"), json!("2"), json!("3")]],
        );

        assert_eq!(table.rows()[0], vec![json!("1"), json!("")]);
        assert_eq!(table.rows()[1], vec![json!("1"), json!("2")]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn renders_scalars_in_printed_form() {
        assert_eq!(render_cell(&json!("Rome")), "Rome");
        assert_eq!(render_cell(&json!(42)), "42");
        assert_eq!(render_cell(&json!(2.5)), "2.5");
        assert_eq!(render_cell(&json!(true)), "True");
        assert_eq!(render_cell(&Value::Null), "None");
        assert_eq!(render_cell(&json!([1, "x"])), r#"[1,"x"]"#);
    }

    #[test]
    fn renders_floats_with_signed_two_digit_exponents() {
        let cases = [
            (1e20, "1e+20"),
            (1.5e16, "1.5e+16"),
            (1e16, "1e+16"),
            (1.234e-7, "1.234e-07"),
            (-2.5e-5, "-2.5e-05"),
            (1e300, "1e+300"),
        ];
        for (value, printed) in cases {
            assert_eq!(render_cell(&json!(value)), printed, "{value}");
        }
    }

    #[test]
    fn renders_floats_in_fixed_notation_inside_the_plain_range() {
        let cases = [
            (1.0, "1.0"),
            (-0.0, "-0.0"),
            (0.0001, "0.0001"),
            (0.00012, "0.00012"),
            (123456.789, "123456.789"),
            (1e15, "1000000000000000.0"),
            (9999999999999998.0, "9999999999999998.0"),
            (0.1, "0.1"),
        ];
        for (value, printed) in cases {
            assert_eq!(render_cell(&json!(value)), printed, "{value}");
        }
        assert_eq!(render_cell(&json!(100_000_000_000_000_000_u64)), "100000000000000000");
    }
}
