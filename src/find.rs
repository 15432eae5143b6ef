//! Request orchestration: validate, plan against the catalog, execute against a source.

use crate::config::FindConfig;
use crate::errors::DbError;
use crate::index::IndexCatalog;
use crate::query::{DocumentSource, ExecutionStats, ExplainReport, FindRequest, execute, plan};
use crate::utils::json::document_to_json;
use bson::{Bson, Document as BsonDocument};
use serde_json::{Map, Value};

/// Documents returned by one find, with the plan facts callers report on.
#[derive(Debug, Clone, PartialEq)]
pub struct FindResult {
    pub docs: Vec<BsonDocument>,
    pub warning: Option<String>,
    pub stats: ExecutionStats,
    /// Whether `execution_stats` was requested; controls [`FindResult::to_json`].
    pub include_stats: bool,
    pub index: String,
    pub full_scan: bool,
}

impl FindResult {
    /// `{"docs": [...], "warning"?: "...", "execution_stats"?: {...}}`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("docs".into(), Value::Array(self.docs.iter().map(document_to_json).collect()));
        if let Some(w) = &self.warning {
            out.insert("warning".into(), Value::String(w.clone()));
        }
        if self.include_stats {
            out.insert(
                "execution_stats".into(),
                serde_json::to_value(self.stats).unwrap_or(Value::Null),
            );
        }
        Value::Object(out)
    }

    /// Values of `field` in result order; documents without it are skipped.
    #[must_use]
    pub fn values_of(&self, field: &str) -> Vec<&Bson> {
        self.docs.iter().filter_map(|d| d.get(field)).collect()
    }
}

/// Validates a selector and options without touching any data.
///
/// # Errors
/// Returns a client-input error for malformed input.
pub fn validate(
    selector: &Bson,
    options: &BsonDocument,
    cfg: &FindConfig,
) -> Result<FindRequest, DbError> {
    FindRequest::validate(selector, options, cfg)
}

/// Plans `request` against `catalog` and executes it on `source`.
///
/// # Errors
/// Propagates source errors; a validated request never fails otherwise.
pub fn find<S>(
    source: &S,
    catalog: &IndexCatalog,
    request: &FindRequest,
    cfg: &FindConfig,
) -> Result<FindResult, DbError>
where
    S: DocumentSource + ?Sized,
{
    let plan = plan(request, catalog, cfg.tie_break);
    let exec = execute(&plan, source)?;
    Ok(FindResult {
        docs: exec.docs,
        warning: plan.warning.clone(),
        stats: exec.stats,
        include_stats: plan.execution_stats,
        full_scan: plan.is_full_scan(),
        index: plan.index.name,
    })
}

/// The plan `find` would run, without running it.
#[must_use]
pub fn explain(catalog: &IndexCatalog, request: &FindRequest, cfg: &FindConfig) -> ExplainReport {
    plan(request, catalog, cfg.tie_break).explain()
}
