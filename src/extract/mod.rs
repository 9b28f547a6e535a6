// src/extract/mod.rs

pub mod columns;
pub mod fetch;
pub mod snapshot;
pub mod source;
pub mod value;

pub use columns::{fetch_columns, ColumnMap};
pub use fetch::{fetch_rows, page_limit, FetchResult, Fetcher};
pub use snapshot::{Snapshot, SnapshotStore};
pub use source::RowSource;
pub use value::coerce;
