// src/extract/columns.rs

use super::source::RowSource;
use crate::api::ColumnDef;
use crate::error::Result;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// Column identifier ↔ display name for one table snapshot.
///
/// Identifiers are unique; display names may repeat, in which case reverse
/// lookups return the first column carrying the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: Vec<ColumnDef>,
    by_id: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-inserting a known id renames it in place.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        match self.by_id.get(&id) {
            Some(&idx) => self.columns[idx].name = name,
            None => {
                self.by_id.insert(id.clone(), self.columns.len());
                self.columns.push(ColumnDef { id, name });
            }
        }
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|&idx| self.columns[idx].name.as_str())
    }

    /// Display name, or the id itself when the column is unknown.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.display_name(id).unwrap_or(id)
    }

    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.as_str())
    }

    /// Reverse lookup for server-side column filtering. Unknown names are
    /// dropped, duplicates collapse, input order is kept.
    pub fn to_identifiers<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            match self.id_for(name.as_ref()) {
                Some(id) if !ids.iter().any(|known| known == id) => ids.push(id.to_string()),
                Some(_) => {}
                None => debug!(column = name.as_ref(), "requested column not in table"),
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef> + '_ {
        self.columns.iter()
    }

    /// `{id: name}` object, as stored in raw snapshots.
    pub fn to_mapping(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|c| (c.id.clone(), Value::String(c.name.clone())))
            .collect()
    }

    pub fn from_mapping(mapping: &Map<String, Value>) -> Self {
        mapping
            .iter()
            .map(|(id, name)| {
                let name = match name {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                ColumnDef::new(id.clone(), name)
            })
            .collect()
    }
}

impl FromIterator<ColumnDef> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = ColumnDef>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for col in iter {
            map.insert(col.id, col.name);
        }
        map
    }
}

/// Fetch the column listing for a table and build a fresh map.
pub async fn fetch_columns<S: RowSource>(
    source: &S,
    doc_id: &str,
    table_id: &str,
) -> Result<ColumnMap> {
    let map: ColumnMap = source.columns(doc_id, table_id).await?.into_iter().collect();
    info!(doc_id, table_id, columns = map.len(), "resolved column names");
    Ok(map)
}
