pub mod scorecard;
pub mod table;

pub use scorecard::{
    DatasetScorecard, QueryFailure, QueryScore, Scorecard, ScorecardRecord, json_schema,
};
pub use table::{QueryResult, Table, render_cell};
