use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scores for one (ground truth, submission) query pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryScore {
    pub cell_f1: f64,
    pub cardinality: f64,
    pub tuple_constraint: f64,
    pub average: f64,
    pub tokens: Option<f64>,
    pub time_seconds: Option<f64>,
}

impl QueryScore {
    #[must_use]
    pub fn new(
        cell_f1: f64,
        cardinality: f64,
        tuple_constraint: f64,
        tokens: Option<f64>,
        time_seconds: Option<f64>,
    ) -> Self {
        Self {
            cell_f1,
            cardinality,
            tuple_constraint,
            average: (cell_f1 + cardinality + tuple_constraint) / 3.0,
            tokens,
            time_seconds,
        }
    }

    /// Score recorded for a query whose ground truth could not be read.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, None, None)
    }
}

/// Aggregated metrics for a dataset or for the cross-dataset `ALL` row.
///
/// `tokens` and `avg_time_seconds` are strict: they are `None` whenever any
/// contributing query (or dataset) lacked the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scorecard {
    pub cell_f1: f64,
    pub cardinality: f64,
    pub tuple_constraint: f64,
    pub average: f64,
    pub queries: usize,
    pub tokens: Option<f64>,
    pub avg_time_seconds: Option<f64>,
}

impl Scorecard {
    #[must_use]
    pub const fn blank() -> Self {
        Self {
            cell_f1: 0.0,
            cardinality: 0.0,
            tuple_constraint: 0.0,
            average: 0.0,
            queries: 0,
            tokens: None,
            avg_time_seconds: None,
        }
    }

    #[must_use]
    pub fn to_record(&self) -> ScorecardRecord {
        ScorecardRecord {
            f1_cell: self.cell_f1,
            cardinality: self.cardinality,
            tuple_constraint: self.tuple_constraint,
            avg_score: self.average,
            queries: self.queries,
            tokens: self.tokens,
            avg_time: self.avg_time_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryFailure {
    pub query: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetScorecard {
    pub name: String,
    pub scorecard: Scorecard,
    pub failures: Vec<QueryFailure>,
}

/// One entry of the `--format json` report, keyed by dataset name or `ALL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScorecardRecord {
    #[serde(rename = "F1-Cell")]
    pub f1_cell: f64,

    #[serde(rename = "Cardinality")]
    pub cardinality: f64,

    #[serde(rename = "Tuple-Constraint")]
    pub tuple_constraint: f64,

    #[serde(rename = "AVG-Score")]
    pub avg_score: f64,

    #[serde(rename = "#Queries")]
    pub queries: usize,

    #[serde(rename = "#Tokens")]
    pub tokens: Option<f64>,

    #[serde(rename = "Avg-Time")]
    pub avg_time: Option<f64>,
}

#[must_use]
pub fn json_schema() -> Value {
    let schema = schemars::schema_for!(ScorecardRecord);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated scorecard schema: {error}");
        }
    }
}
