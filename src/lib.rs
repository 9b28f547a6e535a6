//! Pulls rows out of a Coda table, flattens them into a rectangular [`Table`],
//! cleans columns by name heuristics and derives timesheet metrics.
//!
//! The pipeline runs `extract::fetch` → `process::normalize` → `process::clean`
//! → `metrics` / `export`. [`pipeline::Extractor`] wires the stages together for
//! the CLI and any other front-end.

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod metrics;
pub mod pipeline;
pub mod process;
pub mod settings;

pub use error::{Error, Result};
pub use process::{Cell, Table};
