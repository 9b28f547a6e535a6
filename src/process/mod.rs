// src/process/mod.rs

pub mod clean;
pub mod kind;
pub mod normalize;
pub mod table;

pub use clean::{clean, parse_datetime, parse_duration, parse_numeric};
pub use kind::{classify, ColumnKind, ColumnKinds};
pub use normalize::normalize;
pub use table::{Cell, Table};
