use crate::index::{Constraints, IndexCatalog, IndexDefinition, IndexKey, KeyPart, ScanRange, TieBreak};
use serde::Serialize;
use serde_json::Value;

use super::path::FieldPath;
use super::types::{Direction, FindRequest, Selector, SortSpec};

/// Everything the executor needs for one find: where to scan, what is left to check,
/// and how to shape the output.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub selector: Selector,
    pub index: IndexDefinition,
    /// Leading index fields constrained by the selector; zero means a full scan.
    pub covered: usize,
    pub range: ScanRange,
    pub direction: Direction,
    /// Conjuncts the range does not already guarantee.
    pub residual: Option<Selector>,
    pub sort: Option<SortSpec>,
    /// False when the scan order already satisfies `sort`.
    pub sort_in_memory: bool,
    pub limit: usize,
    pub skip: usize,
    pub fields: Option<Vec<FieldPath>>,
    pub r: u32,
    pub conflicts: bool,
    pub execution_stats: bool,
    pub warning: Option<String>,
}

impl ScanPlan {
    #[must_use]
    pub const fn is_full_scan(&self) -> bool {
        self.covered == 0
    }

    #[must_use]
    pub fn explain(&self) -> ExplainReport {
        ExplainReport {
            index: self.index.clone(),
            covered_fields: self.covered,
            full_scan: self.is_full_scan(),
            selector: self.selector.to_json(),
            range: self.range.to_json(),
            direction: self.direction,
            residual: self.residual.as_ref().map(Selector::to_json),
            sort: self.sort.clone(),
            sort_in_memory: self.sort_in_memory,
            limit: self.limit,
            skip: self.skip,
            fields: self.fields.clone(),
            r: self.r,
            conflicts: self.conflicts,
            warning: self.warning.clone(),
        }
    }
}

/// Serializable view of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainReport {
    pub index: IndexDefinition,
    pub covered_fields: usize,
    pub full_scan: bool,
    pub selector: Value,
    pub range: Value,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual: Option<Value>,
    pub sort: Option<SortSpec>,
    pub sort_in_memory: bool,
    pub limit: usize,
    pub skip: usize,
    pub fields: Option<Vec<FieldPath>>,
    pub r: u32,
    pub conflicts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Range over `def` plus the conjuncts it makes redundant and the number of
/// equality-fixed leading fields.
fn derive_range(def: &IndexDefinition, constraints: &Constraints) -> (ScanRange, Vec<usize>, usize) {
    let mut prefix = IndexKey::default();
    let mut used = Vec::new();
    for field in &def.fields {
        let Some(c) = constraints.get(field) else { break };
        if let Some((pos, v)) = &c.eq {
            prefix = prefix.with(KeyPart::Value(v.clone()));
            used.push(*pos);
            continue;
        }
        used.extend_from_slice(&c.range_conjuncts);
        let eq_fixed = prefix.0.len();
        return (ScanRange::bounded(&prefix, &c.lower, &c.upper), used, eq_fixed);
    }
    let eq_fixed = prefix.0.len();
    if eq_fixed == 0 {
        (ScanRange::full(), used, 0)
    } else {
        (ScanRange::prefix(&prefix), used, eq_fixed)
    }
}

/// True when scanning `def` with the first `eq_fixed` fields pinned yields `sort` order.
fn index_provides_order(def: &IndexDefinition, eq_fixed: usize, sort: &SortSpec) -> bool {
    let (fixed, free) = def.fields.split_at(eq_fixed.min(def.fields.len()));
    let wanted: Vec<&FieldPath> = sort.fields.iter().filter(|f| !fixed.contains(f)).collect();
    wanted.len() <= free.len() && wanted.iter().zip(free).all(|(w, f)| *w == f)
}

/// Picks an index for `request` and derives its scan.
///
/// Candidates come from [`IndexCatalog::select`]. A `use_index` hint wins when the named
/// index is a candidate; otherwise the best candidate is used and the plan carries a
/// warning. Without candidates, an index whose order satisfies the sort is scanned in
/// full, else the primary index.
#[must_use]
pub fn plan(request: &FindRequest, catalog: &IndexCatalog, policy: TieBreak) -> ScanPlan {
    let opts = &request.options;
    let constraints = Constraints::extract(&request.selector);
    let candidates = catalog.select(&constraints, policy);

    let mut warning = None;
    let mut chosen = candidates.first();
    if let Some(name) = &opts.use_index {
        match candidates.iter().find(|c| c.def.name == *name) {
            Some(c) => chosen = Some(c),
            None if catalog.get(name).is_none() => {
                warning = Some(format!("no matching index found, `{name}` does not exist"));
            }
            None => {
                warning = Some(format!(
                    "`{name}` was not used because it does not match the selector"
                ));
            }
        }
    }

    let (index, covered) = match chosen {
        Some(c) => (c.def.clone(), c.covered),
        None => {
            let by_sort = opts.sort.as_ref().and_then(|s| {
                catalog.list().iter().find(|d| index_provides_order(d, 0, s))
            });
            (by_sort.unwrap_or_else(|| catalog.primary()).clone(), 0)
        }
    };

    let (range, used, eq_fixed) = derive_range(&index, &constraints);
    let residual = constraints.residual(&used);
    let (direction, sort_in_memory) = match &opts.sort {
        Some(s) if index_provides_order(&index, eq_fixed, s) => (s.direction, false),
        Some(_) => (Direction::Asc, true),
        None => (Direction::Asc, false),
    };

    log::debug!(
        target: "mangolite::query",
        "plan index={} covered={} residual={} sort_in_memory={}",
        index.name,
        covered,
        residual.is_some(),
        sort_in_memory
    );

    ScanPlan {
        selector: request.selector.clone(),
        index,
        covered,
        range,
        direction,
        residual,
        sort: opts.sort.clone(),
        sort_in_memory,
        limit: opts.limit,
        skip: opts.skip,
        fields: opts.fields.clone(),
        r: opts.r,
        conflicts: opts.conflicts,
        execution_stats: opts.execution_stats,
        warning,
    }
}
