// src/settings.rs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::Path,
};
use tracing::{info, warn};

pub const SETTINGS_FILE: &str = "gui_config.json";

/// Last-used table selection, remembered between runs of a front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub table_id: String,
    #[serde(default)]
    pub max_rows: Option<usize>,
}

impl Settings {
    /// Missing or unreadable files fall back to defaults.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read settings");
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt settings");
                Self::default()
            }
        }
    }

    /// Write atomically: to a tmp file, then rename over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let mut tmp = fs::File::create(&tmp_path).map_err(|e| Error::io(&tmp_path, e))?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n").map_err(|e| Error::io(&tmp_path, e))?;
        drop(tmp);

        fs::rename(&tmp_path, path).map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}
