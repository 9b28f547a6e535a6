// src/api/mod.rs

pub mod client;
pub mod types;

pub use client::{CodaClient, MAX_PAGE_SIZE};
pub use types::{ColumnDef, DocSummary, Page, PageRequest, RawRow, TableSummary};
