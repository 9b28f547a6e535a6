// src/metrics/mod.rs

pub mod aggregate;
pub mod filter;
pub mod summary;
pub mod timesheet;

pub use aggregate::{aggregate, AggregateOp};
pub use filter::{filter, Condition, Predicate};
pub use summary::{summarize, DateRange, HourStats, Summary};
pub use timesheet::{compute_timesheet_metrics, MetricValue, Metrics};
