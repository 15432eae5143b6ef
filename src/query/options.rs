use crate::config::FindConfig;
use crate::errors::DbError;
use crate::utils::json::json_to_bson;
use bson::{Bson, Document as BsonDocument};

use super::path::FieldPath;
use super::types::{Direction, FindOptions, FindRequest, Selector, SortSpec};
use super::value::json_type_name;

const OPTION_KEYS: &[&str] =
    &["limit", "skip", "sort", "fields", "r", "conflicts", "use_index", "execution_stats"];

fn non_negative(option: &'static str, v: &Bson) -> Result<usize, DbError> {
    let n = match v {
        Bson::Int32(i) => i64::from(*i),
        Bson::Int64(i) => *i,
        other => {
            return Err(DbError::option(
                option,
                format!("expected a non-negative integer, got {}", json_type_name(other)),
            ));
        }
    };
    crate::utils::num::i64_to_usize(n)
        .ok_or_else(|| DbError::option(option, format!("expected a non-negative integer, got {n}")))
}

fn boolean(option: &'static str, v: &Bson) -> Result<bool, DbError> {
    match v {
        Bson::Boolean(b) => Ok(*b),
        other => Err(DbError::option(
            option,
            format!("expected a boolean, got {}", json_type_name(other)),
        )),
    }
}

fn parse_direction(v: &Bson) -> Result<Direction, DbError> {
    match v {
        Bson::String(s) if s == "asc" => Ok(Direction::Asc),
        Bson::String(s) if s == "desc" => Ok(Direction::Desc),
        other => Err(DbError::option("sort", format!("unknown direction {other}"))),
    }
}

fn parse_sort(v: &Bson) -> Result<Option<SortSpec>, DbError> {
    let Bson::Array(items) = v else {
        return Err(DbError::option("sort", format!("expected an array, got {}", json_type_name(v))));
    };
    let mut fields = Vec::with_capacity(items.len());
    let mut direction: Option<Direction> = None;
    for item in items {
        let (raw, dir) = match item {
            Bson::String(s) => (s.as_str(), Direction::Asc),
            Bson::Document(d) => match (d.len(), d.iter().next()) {
                (1, Some((k, dv))) => (k.as_str(), parse_direction(dv)?),
                (n, _) => {
                    return Err(DbError::option(
                        "sort",
                        format!("each sort entry needs exactly one field, got {n}"),
                    ));
                }
            },
            other => {
                return Err(DbError::option(
                    "sort",
                    format!("entries must be strings or objects, got {}", json_type_name(other)),
                ));
            }
        };
        let path = FieldPath::parse(raw).map_err(|e| DbError::option("sort", e.to_string()))?;
        match direction {
            Some(d) if d != dir => {
                return Err(DbError::option("sort", "all fields must share one direction"));
            }
            _ => direction = Some(dir),
        }
        fields.push(path);
    }
    Ok(direction.map(|direction| SortSpec { fields, direction }))
}

fn parse_fields(v: &Bson) -> Result<Option<Vec<FieldPath>>, DbError> {
    let Bson::Array(items) = v else {
        return Err(DbError::option(
            "fields",
            format!("expected an array, got {}", json_type_name(v)),
        ));
    };
    if items.is_empty() {
        return Ok(None);
    }
    items
        .iter()
        .map(|item| match item {
            Bson::String(s) => {
                FieldPath::parse(s).map_err(|e| DbError::option("fields", e.to_string()))
            }
            other => Err(DbError::option(
                "fields",
                format!("entries must be field names, got {}", json_type_name(other)),
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_r(v: &Bson) -> Result<u32, DbError> {
    let n = non_negative("r", v)?;
    match u32::try_from(n) {
        Ok(r) if r > 0 => Ok(r),
        _ => Err(DbError::option("r", format!("expected a positive integer, got {n}"))),
    }
}

fn parse_use_index(v: &Bson) -> Result<String, DbError> {
    let name = match v {
        Bson::String(s) => Some(s.as_str()),
        Bson::Array(items) if (1..=2).contains(&items.len()) => {
            if items.iter().all(|i| matches!(i, Bson::String(_))) {
                items.last().and_then(Bson::as_str)
            } else {
                None
            }
        }
        _ => None,
    };
    match name {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(DbError::option("use_index", "expected an index name or [ddoc, name]")),
    }
}

/// Validates the option mapping of a find request. Absent keys take their defaults.
///
/// # Errors
/// Returns a client-input error naming the first offending option.
pub fn parse_options(options: &BsonDocument, cfg: &FindConfig) -> Result<FindOptions, DbError> {
    let mut out = FindOptions { limit: cfg.default_limit, ..FindOptions::default() };
    for (key, v) in options {
        match key.as_str() {
            "limit" => out.limit = non_negative("limit", v)?.min(cfg.max_limit),
            "skip" => out.skip = non_negative("skip", v)?,
            "sort" => out.sort = parse_sort(v)?,
            "fields" => out.fields = parse_fields(v)?,
            "r" => out.r = parse_r(v)?,
            "conflicts" => out.conflicts = boolean("conflicts", v)?,
            "use_index" => out.use_index = Some(parse_use_index(v)?),
            "execution_stats" => out.execution_stats = boolean("execution_stats", v)?,
            other => {
                return Err(DbError::InvalidRequest(format!(
                    "unknown option `{other}`, expected one of {OPTION_KEYS:?}"
                )));
            }
        }
    }
    Ok(out)
}

impl FindRequest {
    /// Validates a selector and its options together; nothing is evaluated on failure.
    ///
    /// # Errors
    /// Returns a client-input error for any malformed selector or option.
    pub fn validate(
        selector: &Bson,
        options: &BsonDocument,
        cfg: &FindConfig,
    ) -> Result<Self, DbError> {
        let selector = Selector::parse(selector)?;
        let options = parse_options(options, cfg)?;
        Ok(Self { selector, options })
    }

    /// Parses a `_find` body: `selector` plus option keys at the top level.
    ///
    /// # Errors
    /// Returns `DbError::InvalidRequest` if `selector` is missing, otherwise as [`Self::validate`].
    pub fn from_document(body: &BsonDocument, cfg: &FindConfig) -> Result<Self, DbError> {
        let selector = body
            .get("selector")
            .ok_or_else(|| DbError::InvalidRequest("missing `selector`".into()))?;
        let mut options = body.clone();
        options.remove("selector");
        Self::validate(selector, &options, cfg)
    }

    /// # Errors
    /// Returns `DbError::Json` for malformed JSON, `DbError::InvalidRequest` if the body is
    /// not an object, otherwise as [`Self::from_document`].
    pub fn from_json(body: &str, cfg: &FindConfig) -> Result<Self, DbError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        match json_to_bson(&value) {
            Bson::Document(d) => Self::from_document(&d, cfg),
            other => Err(DbError::InvalidRequest(format!(
                "request body must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}
