#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod models;
pub mod reader;
pub mod render;

pub use cli::app::{Cli, Command};
pub use error::EvalError;
