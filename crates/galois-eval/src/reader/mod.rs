//! Reads one query result file into a [`Table`].
//!
//! CSV files carry a header row. JSON files come in several shapes, tried in
//! this order: the full `{"result_set", "tokens", "time"}` envelope,
//! `{"columns", "rows"}`, `{"tuples": [..]}`, `{"data": [..]}`, and a bare
//! array of objects or arrays. Anything else reads as an empty table.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{EvalError, EvalResult};
use crate::models::{QueryResult, Table, render_cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Csv,
    Json,
}

impl ResultFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// The other supported format, tried when a submission is not stored
    /// with the ground truth's extension.
    #[must_use]
    pub const fn alternate(self) -> Self {
        match self {
            Self::Csv => Self::Json,
            Self::Json => Self::Csv,
        }
    }
}

/// Reads a ground-truth file. A full envelope contributes only its
/// `result_set`; cost metadata is ignored here.
pub fn read_table_file(path: &Path) -> EvalResult<Table> {
    match format_for(path)? {
        ResultFormat::Csv => read_csv_file(path),
        ResultFormat::Json => {
            let value = read_json_file(path)?;
            Ok(parse_result_value(&value).table)
        }
    }
}

/// Reads a submission file. A missing file is an empty result rather than an
/// error, so the query still gets scored.
pub fn read_submission_file(path: Option<&Path>) -> EvalResult<QueryResult> {
    let Some(path) = path.filter(|path| path.exists()) else {
        return Ok(QueryResult::empty());
    };

    match format_for(path)? {
        ResultFormat::Csv => read_csv_file(path).map(QueryResult::from_table),
        ResultFormat::Json => read_json_file(path).map(|value| parse_result_value(&value)),
    }
}

fn format_for(path: &Path) -> EvalResult<ResultFormat> {
    ResultFormat::from_path(path).ok_or_else(|| EvalError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

fn read_csv_file(path: &Path) -> EvalResult<Table> {
    let input = std::fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv_table(&input).map_err(|source| EvalError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json_file(path: &Path) -> EvalResult<Value> {
    let bytes = std::fs::read(path).map_err(|source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| EvalError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses CSV text whose first record is the header. Header names are
/// trimmed; data rows are padded or truncated to the header width.
///
/// Blank lines are records with no fields, so each one becomes a row of
/// empty cells. A blank first line leaves the table without columns.
pub fn parse_csv_table(input: &str) -> csv::Result<Table> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let offset = record
            .position()
            .map_or(0, |position| position.byte() as usize);
        records.push((content_start(input, offset), record));
    }

    let mut lines: Vec<Vec<Value>> = Vec::new();
    let first = records.first().map_or(input.len(), |(start, _)| *start);
    lines.extend(std::iter::repeat_n(Vec::new(), line_breaks(&input[..first])));
    for (index, (start, record)) in records.iter().enumerate() {
        let end = records
            .get(index + 1)
            .map_or(input.len(), |(next, _)| *next);
        lines.push(
            record
                .iter()
                .map(|field| Value::String(field.to_string()))
                .collect(),
        );
        let blanks = trailing_line_breaks(&input[*start..end]).saturating_sub(1);
        lines.extend(std::iter::repeat_n(Vec::new(), blanks));
    }

    let mut lines = lines.into_iter();
    let Some(header) = lines.next() else {
        return Ok(Table::empty());
    };
    let columns = header
        .iter()
        .map(|field| render_cell(field).trim().to_string())
        .collect();
    Ok(Table::new(columns, lines.collect()))
}

/// The reader may report a record as starting before the blank lines it
/// skipped; record content itself never begins with a line break.
fn content_start(input: &str, offset: usize) -> usize {
    let rest = &input[offset.min(input.len())..];
    input.len() - rest.trim_start_matches(['\r', '\n']).len()
}

fn trailing_line_breaks(text: &str) -> usize {
    let content = text.trim_end_matches(['\r', '\n']);
    line_breaks(&text[content.len()..])
}

/// Counts line breaks in a run of `\r`/`\n`, treating `\r\n` as one.
fn line_breaks(run: &str) -> usize {
    run.matches(['\r', '\n']).count() - run.matches("\r\n").count()
}

/// Interprets a decoded JSON document, unwrapping the full envelope when
/// present.
#[must_use]
pub fn parse_result_value(value: &Value) -> QueryResult {
    if let Value::Object(map) = value
        && let Some(result_set) = map.get("result_set")
    {
        return QueryResult {
            table: parse_table_value(result_set),
            tokens: map.get("tokens").and_then(coerce_f64),
            time_seconds: map.get("time").and_then(coerce_f64),
        };
    }

    QueryResult::from_table(parse_table_value(value))
}

#[must_use]
pub fn parse_table_value(value: &Value) -> Table {
    match value {
        Value::Object(map) => parse_table_object(map),
        Value::Array(items) => parse_table_array(items),
        _ => Table::empty(),
    }
}

fn parse_table_object(map: &Map<String, Value>) -> Table {
    if let (Some(columns), Some(rows)) = (map.get("columns"), map.get("rows")) {
        return table_from_columns_and_rows(columns, rows);
    }
    if let Some(Value::Array(tuples)) = map.get("tuples") {
        return table_from_objects(tuples);
    }
    if let Some(Value::Array(data)) = map.get("data") {
        return parse_table_array(data);
    }
    Table::empty()
}

/// The first element decides the shape: objects are keyed by the union of
/// their keys, arrays get synthesized `c0..cN` columns.
fn parse_table_array(items: &[Value]) -> Table {
    match items.first() {
        Some(Value::Object(_)) => table_from_objects(items),
        Some(Value::Array(_)) => table_from_arrays(items),
        _ => Table::empty(),
    }
}

fn table_from_columns_and_rows(columns: &Value, rows: &Value) -> Table {
    let Value::Array(columns) = columns else {
        return Table::empty();
    };
    let columns: Vec<String> = columns
        .iter()
        .map(|column| render_cell(column).into_owned())
        .collect();
    let rows = match rows {
        Value::Array(rows) => rows
            .iter()
            .map(|row| match row {
                Value::Object(map) => lookup_row(map, &columns),
                Value::Array(values) => values.iter().take(columns.len()).cloned().collect(),
                scalar => vec![scalar.clone()],
            })
            .collect(),
        _ => Vec::new(),
    };
    Table::new(columns, rows)
}

fn table_from_objects(items: &[Value]) -> Table {
    let objects: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();
    let columns: Vec<String> = objects
        .iter()
        .flat_map(|object| object.keys())
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let rows = objects
        .iter()
        .map(|object| lookup_row(object, &columns))
        .collect();
    Table::new(columns, rows)
}

fn table_from_arrays(items: &[Value]) -> Table {
    let arrays: Vec<&Vec<Value>> = items.iter().filter_map(Value::as_array).collect();
    let width = arrays.iter().map(|row| row.len()).max().unwrap_or(0);
    let columns = (0..width).map(|index| format!("c{index}")).collect();
    let rows = arrays.into_iter().cloned().collect();
    Table::new(columns, rows)
}

fn lookup_row(object: &Map<String, Value>, columns: &[String]) -> Vec<Value> {
    columns
        .iter()
        .map(|column| {
            object
                .get(column)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()))
        })
        .collect()
}

/// Token counts and timings may be numbers or numeric strings; anything else
/// is treated as absent.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::{ResultFormat, parse_csv_table, parse_result_value, parse_table_value};

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(
            ResultFormat::from_path(Path::new("Q1.CSV")),
            Some(ResultFormat::Csv)
        );
        assert_eq!(
            ResultFormat::from_path(Path::new("q/Q2.Json")),
            Some(ResultFormat::Json)
        );
        assert_eq!(ResultFormat::from_path(Path::new("Q3.parquet")), None);
        assert_eq!(ResultFormat::Csv.alternate(), ResultFormat::Json);
    }

    #[test]
    fn csv_trims_header_and_pads_short_rows() {
        let table = parse_csv_table("\u{feff} name , year\nAlien,1979\nHeat\n").expect("csv");

        assert_eq!(table.columns(), &["name".to_string(), "year".to_string()]);
        assert_eq!(table.rows()[0], vec![json!("Alien"), json!("1979")]);
        assert_eq!(table.rows()[1], vec![json!("Heat"), json!("")]);
    }

    #[test]
    fn csv_blank_lines_become_empty_rows() {
        let table = parse_csv_table("x\n1\n\n2\n").expect("csv");
        assert_eq!(
            table.rows(),
            &[vec![json!("1")], vec![json!("")], vec![json!("2")]]
        );

        let table = parse_csv_table("x,y\r\n1,2\r\n\r\n\r\n").expect("csv");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[2], vec![json!(""), json!("")]);

        let table = parse_csv_table("x\n1").expect("csv");
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn csv_blank_line_inside_quotes_is_cell_content() {
        let table = parse_csv_table("x\n\"a\n\n\"\n\nb\n").expect("csv");
        assert_eq!(
            table.rows(),
            &[vec![json!("a\n\n")], vec![json!("")], vec![json!("b")]]
        );
    }

    #[test]
    fn csv_leading_blank_line_yields_no_columns() {
        let table = parse_csv_table("\nx\n1\n").expect("csv");
        assert!(table.columns().is_empty());
        assert_eq!(table.row_count(), 2);
        assert!(table.rows().iter().all(Vec::is_empty));
    }

    #[test]
    fn csv_truncates_long_rows_and_handles_empty_input() {
        let table = parse_csv_table("a\n1,2,3\n").expect("csv");
        assert_eq!(table.rows(), &[vec![json!("1")]]);

        let empty = parse_csv_table("").expect("csv");
        assert!(empty.columns().is_empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn columns_and_rows_accept_objects_and_positional_rows() {
        let table = parse_table_value(&json!({
            "columns": ["title", "year"],
            "rows": [
                {"title": "Alien"},
                ["Heat", 1995, "extra"],
                ["Ran"]
            ]
        }));

        assert_eq!(table.columns(), &["title".to_string(), "year".to_string()]);
        assert_eq!(table.rows()[0], vec![json!("Alien"), json!("")]);
        assert_eq!(table.rows()[1], vec![json!("Heat"), json!(1995)]);
        assert_eq!(table.rows()[2], vec![json!("Ran"), json!("")]);
    }

    #[test]
    fn tuples_use_sorted_union_of_keys() {
        let table = parse_table_value(&json!({
            "tuples": [{"b": 1, "a": 2}, {"c": 3}]
        }));

        assert_eq!(
            table.columns(),
            &["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(table.rows()[0], vec![json!(2), json!(1), json!("")]);
        assert_eq!(table.rows()[1], vec![json!(""), json!(""), json!(3)]);
    }

    #[test]
    fn data_arrays_synthesize_columns_from_widest_row() {
        let table = parse_table_value(&json!({"data": [[1], [1, 2, 3]]}));

        assert_eq!(
            table.columns(),
            &["c0".to_string(), "c1".to_string(), "c2".to_string()]
        );
        assert_eq!(table.rows()[0], vec![json!(1), json!(""), json!("")]);
    }

    #[test]
    fn bare_lists_and_unknown_shapes() {
        let table = parse_table_value(&json!([{"x": "1"}, {"x": "2"}]));
        assert_eq!(table.row_count(), 2);

        assert!(parse_table_value(&json!({"rows": [[1]]})).is_empty());
        assert!(parse_table_value(&json!("scalar")).is_empty());
        assert!(parse_table_value(&json!([])).is_empty());
        assert!(parse_table_value(&json!([1, 2])).is_empty());
    }

    #[test]
    fn full_envelope_extracts_tokens_and_time() {
        let result = parse_result_value(&json!({
            "result_set": {"columns": ["x"], "rows": [["1"]]},
            "tokens": "1500",
            "time": 2.25
        }));

        assert_eq!(result.table.row_count(), 1);
        assert_eq!(result.tokens, Some(1500.0));
        assert_eq!(result.time_seconds, Some(2.25));
    }

    #[test]
    fn unparsable_metadata_is_absent_not_an_error() {
        let result = parse_result_value(&json!({
            "result_set": [],
            "tokens": "lots",
            "time": null
        }));

        assert!(result.table.is_empty());
        assert_eq!(result.tokens, None);
        assert_eq!(result.time_seconds, None);
    }

    #[test]
    fn simple_documents_carry_no_metadata() {
        let result = parse_result_value(&json!([{"x": 1}]));
        assert_eq!(result.tokens, None);
        assert_eq!(result.time_seconds, None);
    }
}
