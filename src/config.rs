// src/config.rs

use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::{
    collections::HashMap,
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

pub const TOKEN_VAR: &str = "CODA_API_TOKEN";
pub const DOC_VAR: &str = "CODA_DOC_ID";
pub const TABLE_VAR: &str = "CODA_TABLE_ID";
pub const BASE_URL_VAR: &str = "CODA_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://coda.io/apis/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime settings: credentials, upstream location and on-disk layout.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub doc_id: Option<String>,
    pub table_id: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            api_token: None,
            doc_id: None,
            table_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Read the process environment, falling back to `dotenv` for unset keys.
    pub fn load(dotenv: Option<&Path>) -> Result<Self> {
        let file_vars = match dotenv {
            Some(path) => read_dotenv(path)?,
            None => HashMap::new(),
        };
        Ok(Self::from_lookup(|key| {
            env::var(key).ok().or_else(|| file_vars.get(key).cloned())
        }))
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self {
            api_token: get(TOKEN_VAR),
            doc_id: get(DOC_VAR),
            table_id: get(TABLE_VAR),
            ..Self::default()
        };
        if let Some(base) = get(BASE_URL_VAR) {
            cfg.base_url = base;
        }
        cfg
    }

    pub fn token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| Error::Config(format!("missing required environment variable: {TOKEN_VAR}")))
    }

    /// Fail with every missing variable listed at once.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            (TOKEN_VAR, self.api_token.is_none()),
            (DOC_VAR, self.doc_id.is_none()),
            (TABLE_VAR, self.table_id.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.raw_dir, &self.processed_dir, &self.logs_dir] {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        Ok(())
    }

    /// `logs/extraction_YYYYmmdd.log`
    pub fn daily_log_path(&self, day: NaiveDate) -> PathBuf {
        self.logs_dir
            .join(format!("extraction_{}.log", day.format("%Y%m%d")))
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// optional `export ` prefix and matching outer quotes are stripped.
pub fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

/// A missing file yields an empty map.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let vars = parse_dotenv(&contents);
            debug!(path = %path.display(), count = vars.len(), "loaded dotenv file");
            Ok(vars)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
