//! Report renderers: aligned text table, CSV, JSON and LaTeX.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use serde::Serialize;

use crate::eval::overall_scorecard;
use crate::models::{DatasetScorecard, Scorecard, ScorecardRecord};

pub const HEADERS: [&str; 8] = [
    "Dataset",
    "F1-Cell",
    "Cardinality",
    "Tuple Constr.",
    "AVG-Score",
    "#Queries",
    "#Tokens",
    "Avg Time (s)",
];

pub const OVERALL_LABEL: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Tex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatexOptions {
    pub caption: Option<String>,
    pub label: Option<String>,
    pub booktabs: bool,
}

/// One labelled line of the report: a dataset or the `ALL` row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub label: String,
    pub scorecard: Scorecard,
}

/// Per-dataset rows, or a single `ALL` row when `overall` is set.
#[must_use]
pub fn report_rows(datasets: &[DatasetScorecard], overall: bool) -> Vec<ReportRow> {
    if overall {
        return vec![ReportRow {
            label: OVERALL_LABEL.to_string(),
            scorecard: overall_scorecard(datasets),
        }];
    }

    datasets
        .iter()
        .map(|dataset| ReportRow {
            label: dataset.name.clone(),
            scorecard: dataset.scorecard,
        })
        .collect()
}

/// Renders the full report, terminated by a newline.
pub fn render_report(
    rows: &[ReportRow],
    format: OutputFormat,
    latex: &LatexOptions,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_text_table(&display_cells(rows))),
        OutputFormat::Csv => render_csv(&display_cells(rows)),
        OutputFormat::Json => render_json(rows),
        OutputFormat::Tex => Ok(render_latex(&display_cells(rows), latex)),
    }
}

#[must_use]
pub fn format_metric(value: f64) -> String {
    format!("{value:.3}")
}

/// Whole numbers print without a fractional part; blank when absent.
#[must_use]
pub fn format_tokens(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => {
            if (value - value.round()).abs() < 1e-9 {
                format!("{:.0}", value.round())
            } else {
                format!("{value:.0}")
            }
        }
        _ => String::new(),
    }
}

#[must_use]
pub fn format_time(value: Option<f64>) -> String {
    value.map(format_metric).unwrap_or_default()
}

fn display_cells(rows: &[ReportRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let card = &row.scorecard;
            vec![
                row.label.clone(),
                format_metric(card.cell_f1),
                format_metric(card.cardinality),
                format_metric(card.tuple_constraint),
                format_metric(card.average),
                card.queries.to_string(),
                format_tokens(card.tokens),
                format_time(card.avg_time_seconds),
            ]
        })
        .collect()
}

/// Bordered, left-aligned table sized to the widest cell of each column.
#[must_use]
pub fn render_text_table(rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = HEADERS.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let line = |cells: &[&str]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut out = vec![border.clone(), line(HEADERS.as_slice()), border.clone()];
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(line(cells.as_slice()));
    }
    out.push(border);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Header plus rows, CRLF-terminated.
pub fn render_csv(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| anyhow!("failed to flush CSV report: {}", error.error()))?;
    String::from_utf8(bytes).context("CSV report is not valid UTF-8")
}

/// Object keyed by row label with unrounded values and `null` for blanks.
pub fn render_json(rows: &[ReportRow]) -> Result<String> {
    let records: BTreeMap<&str, ScorecardRecord> = rows
        .iter()
        .map(|row| (row.label.as_str(), row.scorecard.to_record()))
        .collect();

    let mut text =
        serde_json::to_string_pretty(&records).context("failed to serialize JSON report")?;
    text.push('\n');
    Ok(text)
}

#[must_use]
pub fn render_latex(rows: &[Vec<String>], options: &LatexOptions) -> String {
    let caption = options.caption.as_deref().filter(|text| !text.is_empty());
    let label = options.label.as_deref().filter(|text| !text.is_empty());
    let wrap = caption.is_some() || label.is_some();
    let align = format!("l{}", "r".repeat(HEADERS.len() - 1));

    let mut out = Vec::new();
    if wrap {
        out.push(r"\begin{table}[!ht]".to_string());
        out.push(r"\centering".to_string());
    }
    out.push(format!(r"\begin{{tabular}}{{{align}}}"));

    let (top, mid, bottom) = if options.booktabs {
        (r"\toprule", r"\midrule", r"\bottomrule")
    } else {
        (r"\hline", r"\hline", r"\hline")
    };
    out.push(top.to_string());
    out.push(latex_row(HEADERS));
    out.push(mid.to_string());
    for row in rows {
        out.push(latex_row(row.iter().map(String::as_str)));
    }
    out.push(bottom.to_string());
    out.push(r"\end{tabular}".to_string());

    if let Some(caption) = caption {
        out.push(format!(r"\caption{{{}}}", latex_escape(caption)));
    }
    if let Some(label) = label {
        out.push(format!(r"\label{{{}}}", latex_escape(label)));
    }
    if wrap {
        out.push(r"\end{table}".to_string());
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn latex_row<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.into_iter().map(latex_escape).collect();
    format!("{} \\\\", cells.join(" & "))
}

#[must_use]
pub fn latex_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            '\\' => escaped.push_str(r"\textbackslash{}"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
