use crate::document::{CONFLICTS_FIELD, Document};
use crate::errors::DbError;
use crate::index::{IndexDefinition, ScanRange};
use crate::utils::num::{u128_to_u64_saturating, usize_to_u64};
use bson::{Bson, Document as BsonDocument};
use serde::Serialize;

use super::eval::{compare_docs, matches, project_fields};
use super::plan::ScanPlan;
use super::types::Direction;

/// Ordered document access by index range.
///
/// `scan` yields documents in the index's key order (ties by document id), reversed for
/// `Direction::Desc`. The iterator is lazy and finite; dropping it mid-way has no effect
/// on the source.
pub trait DocumentSource {
    /// # Errors
    /// Returns `DbError::NoSuchIndex` if the source does not hold `index`.
    fn scan<'a>(
        &'a self,
        index: &IndexDefinition,
        range: &ScanRange,
        direction: Direction,
        read_quorum: u32,
    ) -> Result<Box<dyn Iterator<Item = &'a Document> + 'a>, DbError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    pub total_keys_examined: u64,
    pub total_docs_examined: u64,
    pub results_returned: u64,
    pub execution_time_ms: u64,
}

/// Output of one executed plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub docs: Vec<BsonDocument>,
    pub stats: ExecutionStats,
}

fn shape(doc: &Document, plan: &ScanPlan) -> BsonDocument {
    let mut body = doc.data.clone();
    if plan.conflicts && !doc.conflicts.is_empty() {
        let revs = doc.conflicts.iter().cloned().map(Bson::String).collect();
        body.insert(CONFLICTS_FIELD, Bson::Array(revs));
    }
    match &plan.fields {
        Some(fields) => project_fields(&body, fields),
        None => body,
    }
}

/// Runs `plan` against `source`: scan, residual filter, sort, skip, limit, conflicts,
/// projection, in that order. Without an in-memory sort the scan stops as soon as
/// `limit` documents are collected.
///
/// # Errors
/// Propagates errors from [`DocumentSource::scan`].
pub fn execute<S>(plan: &ScanPlan, source: &S) -> Result<Execution, DbError>
where
    S: DocumentSource + ?Sized,
{
    let start = std::time::Instant::now();
    let mut examined = 0usize;
    let keep = |d: &Document| plan.residual.as_ref().is_none_or(|s| matches(&d.data, s));

    let selected: Vec<&Document> = if plan.limit == 0 {
        Vec::new()
    } else if plan.sort_in_memory {
        let mut buf = Vec::new();
        for d in source.scan(&plan.index, &plan.range, plan.direction, plan.r)? {
            examined += 1;
            if keep(d) {
                buf.push(d);
            }
        }
        if let Some(sort) = &plan.sort {
            buf.sort_by(|a, b| compare_docs(&a.data, &b.data, sort));
        }
        buf.into_iter().skip(plan.skip).take(plan.limit).collect()
    } else {
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for d in source.scan(&plan.index, &plan.range, plan.direction, plan.r)? {
            examined += 1;
            if !keep(d) {
                continue;
            }
            if skipped < plan.skip {
                skipped += 1;
                continue;
            }
            out.push(d);
            if out.len() >= plan.limit {
                break;
            }
        }
        out
    };

    let docs: Vec<BsonDocument> = selected.into_iter().map(|d| shape(d, plan)).collect();
    let stats = ExecutionStats {
        total_keys_examined: usize_to_u64(examined),
        total_docs_examined: usize_to_u64(examined),
        results_returned: usize_to_u64(docs.len()),
        execution_time_ms: u128_to_u64_saturating(start.elapsed().as_millis()),
    };
    crate::dev6!(
        "{{\"bench\":\"query\",\"op\":\"find\",\"index\":{},\"duration_ms\":{},\"used_index\":{},\"sort_in_memory\":{},\"docs_examined\":{},\"result_count\":{},\"limit\":{},\"skip\":{}}}",
        serde_json::Value::from(plan.index.name.as_str()),
        stats.execution_time_ms,
        !plan.is_full_scan(),
        plan.sort_in_memory,
        stats.total_docs_examined,
        stats.results_returned,
        usize_to_u64(plan.limit),
        usize_to_u64(plan.skip)
    );
    Ok(Execution { docs, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FindConfig;
    use crate::index::{BTreeIndex, IndexCatalog, TieBreak};
    use crate::query::plan::plan;
    use crate::query::types::FindRequest;
    use bson::doc;

    /// Slice-backed source with a single declared index, enough to drive the executor.
    struct Fixture {
        catalog: IndexCatalog,
        indexes: Vec<BTreeIndex>,
        docs: Vec<Document>,
    }

    impl Fixture {
        fn new(index_fields: &[&str]) -> Self {
            let docs: Vec<Document> = [
                doc! {"_id": "a", "n": 3, "tag": "x"},
                doc! {"_id": "b", "n": 1, "tag": "y"},
                doc! {"_id": "c", "n": 2, "tag": "x"},
                doc! {"_id": "d", "tag": "x"},
            ]
            .into_iter()
            .map(|d| Document::new(d).unwrap())
            .collect();
            let mut catalog = IndexCatalog::new();
            let fields = index_fields
                .iter()
                .map(|f| crate::query::path::FieldPath::parse(f).unwrap())
                .collect::<Vec<_>>();
            catalog.add(IndexDefinition::new("by", fields)).unwrap();
            let indexes =
                catalog.list().iter().map(|d| BTreeIndex::build(d.clone(), docs.iter())).collect();
            Self { catalog, indexes, docs }
        }

        fn run(&self, body: &str) -> Execution {
            let req = FindRequest::from_json(body, &FindConfig::default()).unwrap();
            let p = plan(&req, &self.catalog, TieBreak::FirstDeclared);
            execute(&p, self).unwrap()
        }
    }

    impl DocumentSource for Fixture {
        fn scan<'a>(
            &'a self,
            index: &IndexDefinition,
            range: &ScanRange,
            direction: Direction,
            _read_quorum: u32,
        ) -> Result<Box<dyn Iterator<Item = &'a Document> + 'a>, DbError> {
            let idx = self
                .indexes
                .iter()
                .find(|i| i.def.name == index.name)
                .ok_or_else(|| DbError::NoSuchIndex(index.name.clone()))?;
            Ok(Box::new(
                idx.scan(range, direction)
                    .filter_map(move |id| self.docs.iter().find(|d| &d.id == id)),
            ))
        }
    }

    fn ids(e: &Execution) -> Vec<&str> {
        e.docs.iter().map(|d| d.get_str("_id").unwrap()).collect()
    }

    #[test]
    fn index_order_and_residual() {
        let f = Fixture::new(&["n"]);
        let e = f.run(r#"{"selector": {"n": {"$gt": 0}, "tag": "x"}}"#);
        assert_eq!(ids(&e), ["c", "a"]);
        assert_eq!(e.stats.results_returned, 2);
        assert_eq!(e.stats.total_docs_examined, 3);
    }

    #[test]
    fn skip_limit_and_early_stop() {
        let f = Fixture::new(&["n"]);
        let e = f.run(r#"{"selector": {"n": {"$gt": 0}}, "skip": 1, "limit": 1}"#);
        assert_eq!(ids(&e), ["c"]);
        assert_eq!(e.stats.total_keys_examined, 2);
        let e = f.run(r#"{"selector": {"n": {"$gt": 0}}, "limit": 0}"#);
        assert!(e.docs.is_empty());
    }

    #[test]
    fn in_memory_sort_puts_missing_first() {
        let f = Fixture::new(&["tag"]);
        let e = f.run(r#"{"selector": {"tag": {"$gte": "x"}}, "sort": ["n"]}"#);
        assert_eq!(ids(&e), ["d", "b", "c", "a"]);
        let e = f.run(r#"{"selector": {"tag": {"$gte": "x"}}, "sort": [{"n": "desc"}]}"#);
        assert_eq!(ids(&e), ["a", "c", "b", "d"]);
    }

    #[test]
    fn index_provided_descending_order() {
        let f = Fixture::new(&["n"]);
        let e = f.run(r#"{"selector": {"n": {"$gt": 0}}, "sort": [{"n": "desc"}]}"#);
        assert_eq!(ids(&e), ["a", "c", "b"]);
    }

    #[test]
    fn projection_and_conflicts() {
        let mut f = Fixture::new(&["n"]);
        f.docs[0] = f.docs[0].clone().with_conflicts(vec!["2-abc".into()]);
        let e = f.run(r#"{"selector": {"n": 3}, "conflicts": true}"#);
        assert_eq!(e.docs[0].get_array(CONFLICTS_FIELD).unwrap().len(), 1);
        let e = f.run(r#"{"selector": {"n": 3}, "conflicts": true, "fields": ["n"]}"#);
        assert_eq!(e.docs[0], doc! {"n": 3});
        let e = f.run(r#"{"selector": {"n": 3}, "fields": ["_id", "tag"]}"#);
        assert_eq!(e.docs[0], doc! {"_id": "a", "tag": "x"});
    }

    #[test]
    fn dev6_line_reports_index() {
        let _g = crate::utils::devlog::enable_thread_sink();
        let f = Fixture::new(&["n"]);
        f.run(r#"{"selector": {"n": {"$lt": 3}}}"#);
        let lines = crate::utils::devlog::drain();
        let line = lines.iter().find(|l| l.contains("\"bench\":\"query\"")).unwrap();
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["index"], "by");
        assert_eq!(v["used_index"], true);
    }
}
