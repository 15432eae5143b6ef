use crate::errors::DbError;
use crate::index::TieBreak;
use crate::query::types::{DEFAULT_LIMIT, MAX_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-wide knobs for find requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FindConfig {
    /// `limit` applied when a request does not carry one.
    pub default_limit: usize,
    /// Upper clamp for any requested `limit`.
    pub max_limit: usize,
    /// Requests slower than this are logged under `mangolite::metrics`.
    pub slow_query_ms: u64,
    /// Policy among candidate indexes that cover the same number of fields.
    pub tie_break: TieBreak,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            slow_query_ms: 500,
            tie_break: TieBreak::FirstDeclared,
        }
    }
}

impl FindConfig {
    /// # Errors
    /// Returns `DbError::Config` if the TOML is malformed or names unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        let cfg: Self = toml::from_str(s).map_err(|e| DbError::Config(e.to_string()))?;
        cfg.validate()
    }

    /// # Errors
    /// Returns `DbError::Io` if the file cannot be read, `DbError::Config` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Defaults, then the optional TOML file, then `MANGOLITE_*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file is unreadable or any source holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, DbError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_overrides(|k| std::env::var(k).ok())
    }

    /// Applies overrides from `lookup` (keyed by environment variable name).
    ///
    /// # Errors
    /// Returns `DbError::Config` for values that do not parse.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MANGOLITE_DEFAULT_LIMIT") {
            self.default_limit = parse_env("MANGOLITE_DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = lookup("MANGOLITE_MAX_LIMIT") {
            self.max_limit = parse_env("MANGOLITE_MAX_LIMIT", &v)?;
        }
        if let Some(v) = lookup("MANGOLITE_SLOW_QUERY_MS") {
            self.slow_query_ms = parse_env("MANGOLITE_SLOW_QUERY_MS", &v)?;
        }
        if let Some(v) = lookup("MANGOLITE_TIE_BREAK") {
            self.tie_break = v.parse()?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, DbError> {
        if self.max_limit == 0 {
            return Err(DbError::Config("max_limit must be positive".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(DbError::Config(format!(
                "default_limit {} exceeds max_limit {}",
                self.default_limit, self.max_limit
            )));
        }
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, v: &str) -> Result<T, DbError> {
    v.trim().parse().map_err(|_| DbError::Config(format!("{key}: cannot parse `{v}`")))
}
