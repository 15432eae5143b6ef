//! Declared indexes and their match against a selector's constrained fields.

use crate::document::ID_FIELD;
use crate::errors::DbError;
use crate::query::path::FieldPath;
use crate::query::types::{CmpOp, Combinator, Condition, Node, Selector};
use crate::query::value::compare_values;
use bson::Bson;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Bound;
use std::str::FromStr;

/// Name of the built-in index over `_id` that every collection carries.
pub const PRIMARY_INDEX: &str = "_all_docs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<FieldPath>,
}

impl IndexDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldPath>) -> Self {
        Self { name: name.into(), fields }
    }

    #[must_use]
    pub fn primary() -> Self {
        Self::new(PRIMARY_INDEX, vec![primary_field()])
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.name == PRIMARY_INDEX
    }

    /// Default name for an index declared without one: its fields joined by `-`.
    #[must_use]
    pub fn default_name(fields: &[FieldPath]) -> String {
        fields.iter().map(ToString::to_string).collect::<Vec<_>>().join("-")
    }
}

fn primary_field() -> FieldPath {
    FieldPath::root().join_segment(ID_FIELD)
}

/// Ordering among candidates that cover the same number of leading fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earliest declared wins.
    #[default]
    FirstDeclared,
    /// Most recently declared wins.
    LastDeclared,
    /// Fewest index fields wins, then earliest declared.
    Narrowest,
}

impl FromStr for TieBreak {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "first_declared" => Ok(Self::FirstDeclared),
            "last_declared" => Ok(Self::LastDeclared),
            "narrowest" => Ok(Self::Narrowest),
            other => Err(DbError::Config(format!("unknown tie_break policy `{other}`"))),
        }
    }
}

/// Usable constraints on one field, collected from top-level conjuncts.
#[derive(Debug, Clone)]
pub struct FieldConstraint {
    /// First equality conjunct: its position and operand.
    pub eq: Option<(usize, Bson)>,
    /// Tightest lower and upper bounds across the range conjuncts.
    pub lower: Bound<Bson>,
    pub upper: Bound<Bson>,
    /// Positions of every `$gt`/`$gte`/`$lt`/`$lte` conjunct on the field.
    pub range_conjuncts: Vec<usize>,
}

impl Default for FieldConstraint {
    fn default() -> Self {
        Self { eq: None, lower: Bound::Unbounded, upper: Bound::Unbounded, range_conjuncts: Vec::new() }
    }
}

fn tighter(cur: Bound<Bson>, new: Bound<Bson>, keep_greater: bool) -> Bound<Bson> {
    match (&cur, &new) {
        (Bound::Unbounded, _) => new,
        (_, Bound::Unbounded) => cur,
        (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) => {
            match (compare_values(b, a), keep_greater) {
                (Ordering::Greater, true) | (Ordering::Less, false) => new,
                (Ordering::Equal, _) if matches!(new, Bound::Excluded(_)) => new,
                _ => cur,
            }
        }
    }
}

/// Top-level conjuncts of a selector, with the equality and range constraints an index
/// scan can use. Anything under `$or`, `$nor` or `$not` is opaque here.
#[derive(Debug, Clone)]
pub struct Constraints {
    conjuncts: Vec<Node>,
    by_field: HashMap<FieldPath, FieldConstraint>,
}

fn flatten(node: &Node, out: &mut Vec<Node>) {
    match node {
        Node::Combination { kind: Combinator::And, children } => {
            for c in children {
                flatten(c, out);
            }
        }
        other => out.push(other.clone()),
    }
}

impl Constraints {
    #[must_use]
    pub fn extract(selector: &Selector) -> Self {
        let mut conjuncts = Vec::new();
        flatten(selector.root(), &mut conjuncts);
        let mut by_field: HashMap<FieldPath, FieldConstraint> = HashMap::new();
        for (pos, node) in conjuncts.iter().enumerate() {
            let Node::Field { path, cond: Condition::Cmp { op, value } } = node else { continue };
            if path.is_root() || *op == CmpOp::Ne {
                continue;
            }
            let c = by_field.entry(path.clone()).or_default();
            match op {
                CmpOp::Eq => {
                    if c.eq.is_none() {
                        c.eq = Some((pos, value.clone()));
                    }
                    continue;
                }
                CmpOp::Gt => {
                    c.lower = tighter(c.lower.clone(), Bound::Excluded(value.clone()), true);
                }
                CmpOp::Gte => {
                    c.lower = tighter(c.lower.clone(), Bound::Included(value.clone()), true);
                }
                CmpOp::Lt => {
                    c.upper = tighter(c.upper.clone(), Bound::Excluded(value.clone()), false);
                }
                CmpOp::Lte => {
                    c.upper = tighter(c.upper.clone(), Bound::Included(value.clone()), false);
                }
                CmpOp::Ne => {}
            }
            c.range_conjuncts.push(pos);
        }
        Self { conjuncts, by_field }
    }

    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldConstraint> {
        self.by_field.get(path)
    }

    /// Number of leading `fields` that each carry a usable constraint.
    #[must_use]
    pub fn covered(&self, fields: &[FieldPath]) -> usize {
        fields.iter().take_while(|f| self.by_field.contains_key(*f)).count()
    }

    /// The selector left after dropping the conjuncts at `used`; `None` if nothing is left.
    #[must_use]
    pub fn residual(&self, used: &[usize]) -> Option<Selector> {
        let mut rest: Vec<Node> = self
            .conjuncts
            .iter()
            .enumerate()
            .filter(|(pos, _)| !used.contains(pos))
            .map(|(_, n)| n.clone())
            .collect();
        match rest.len() {
            0 => None,
            1 => rest.pop().map(|root| Selector { root }),
            _ => Some(Selector { root: Node::Combination { kind: Combinator::And, children: rest } }),
        }
    }
}

/// An index usable for a selector, and how many of its leading fields the selector covers.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub def: &'a IndexDefinition,
    pub covered: usize,
    position: usize,
}

/// Indexes of one collection in declaration order. The primary index is always present.
#[derive(Debug, Clone)]
pub struct IndexCatalog {
    defs: Vec<IndexDefinition>,
}

impl Default for IndexCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self { defs: vec![IndexDefinition::primary()] }
    }

    /// All indexes, primary first, then declared ones in creation order.
    #[must_use]
    pub fn list(&self) -> &[IndexDefinition] {
        &self.defs
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexDefinition> {
        self.defs.iter().find(|d| d.name == name)
    }

    #[must_use]
    pub fn primary(&self) -> &IndexDefinition {
        &self.defs[0]
    }

    /// # Errors
    /// `IndexAlreadyExists` if the name or the exact field list is taken,
    /// `InvalidRequest` for an empty field list.
    pub fn add(&mut self, def: IndexDefinition) -> Result<(), DbError> {
        if def.fields.is_empty() {
            return Err(DbError::InvalidRequest("an index needs at least one field".into()));
        }
        if let Some(existing) = self.defs.iter().find(|d| d.name == def.name || d.fields == def.fields)
        {
            return Err(DbError::IndexAlreadyExists(existing.name.clone()));
        }
        self.defs.push(def);
        Ok(())
    }

    /// # Errors
    /// `NoSuchIndex` for unknown names, `InvalidRequest` for the primary index.
    pub fn remove(&mut self, name: &str) -> Result<IndexDefinition, DbError> {
        if name == PRIMARY_INDEX {
            return Err(DbError::InvalidRequest(format!("`{PRIMARY_INDEX}` cannot be deleted")));
        }
        let pos = self
            .defs
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| DbError::NoSuchIndex(name.to_string()))?;
        Ok(self.defs.remove(pos))
    }

    /// Indexes whose leading fields are constrained, best first: most covered fields,
    /// declared indexes before the primary one, then `policy`.
    #[must_use]
    pub fn select(&self, constraints: &Constraints, policy: TieBreak) -> Vec<Candidate<'_>> {
        let mut out: Vec<Candidate<'_>> = self
            .defs
            .iter()
            .enumerate()
            .filter_map(|(position, def)| {
                let covered = constraints.covered(&def.fields);
                (covered > 0).then_some(Candidate { def, covered, position })
            })
            .collect();
        out.sort_by(|a, b| {
            b.covered
                .cmp(&a.covered)
                .then_with(|| a.def.is_primary().cmp(&b.def.is_primary()))
                .then_with(|| match policy {
                    TieBreak::FirstDeclared => a.position.cmp(&b.position),
                    TieBreak::LastDeclared => b.position.cmp(&a.position),
                    TieBreak::Narrowest => a
                        .def
                        .fields
                        .len()
                        .cmp(&b.def.fields.len())
                        .then_with(|| a.position.cmp(&b.position)),
                })
        });
        out
    }
}
