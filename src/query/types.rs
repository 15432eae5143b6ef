use bson::Bson;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::path::FieldPath;
use crate::utils::json::bson_to_json;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_SELECTOR_DEPTH: usize = 64;
pub(crate) const DEFAULT_LIMIT: usize = 25;
pub(crate) const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort fields with the single direction they all share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub fields: Vec<FieldPath>,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
    Nor,
}

impl Combinator {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
            Self::Nor => "$nor",
        }
    }
}

/// Operator applied to the value found at a field path.
#[derive(Debug, Clone)]
pub enum Condition {
    Cmp { op: CmpOp, value: Bson },
    Exists(bool),
    Type(&'static str),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Size(usize),
    Mod { divisor: i64, remainder: i64 },
    All(Vec<Bson>),
    ElemMatch(Box<Node>),
    #[cfg(feature = "regex")]
    Regex(regex::Regex),
}

/// Selector tree node.
#[derive(Debug, Clone)]
pub enum Node {
    Combination { kind: Combinator, children: Vec<Node> },
    Not(Box<Node>),
    Field { path: FieldPath, cond: Condition },
}

impl Node {
    /// Normalized Mango form, one operator per field, used by explain and query logs.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Combination { kind, children } => {
                json!({ kind.name(): children.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
            Self::Not(child) => json!({ "$not": child.to_json() }),
            Self::Field { path, cond } => {
                let op = cond_to_json(cond);
                if path.is_root() { op } else { json!({ path.to_string(): op }) }
            }
        }
    }
}

fn values_to_json(values: &[Bson]) -> Value {
    Value::Array(values.iter().map(bson_to_json).collect())
}

fn cond_to_json(cond: &Condition) -> Value {
    match cond {
        Condition::Cmp { op, value } => json!({ op.name(): bson_to_json(value) }),
        Condition::Exists(b) => json!({ "$exists": b }),
        Condition::Type(t) => json!({ "$type": t }),
        Condition::In(vs) => json!({ "$in": values_to_json(vs) }),
        Condition::Nin(vs) => json!({ "$nin": values_to_json(vs) }),
        Condition::Size(n) => json!({ "$size": n }),
        Condition::Mod { divisor, remainder } => json!({ "$mod": [divisor, remainder] }),
        Condition::All(vs) => json!({ "$all": values_to_json(vs) }),
        Condition::ElemMatch(inner) => json!({ "$elemMatch": inner.to_json() }),
        #[cfg(feature = "regex")]
        Condition::Regex(re) => json!({ "$regex": re.as_str() }),
    }
}

/// A validated selector. The only way to obtain one is [`Selector::parse`], so every
/// tree the evaluator and planner see has passed validation.
#[derive(Debug, Clone)]
pub struct Selector {
    pub(crate) root: Node,
}

impl Selector {
    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }
}

/// Validated find options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: usize,
    pub skip: usize,
    pub sort: Option<SortSpec>,
    pub fields: Option<Vec<FieldPath>>,
    pub r: u32,
    pub conflicts: bool,
    pub use_index: Option<String>,
    pub execution_stats: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
            sort: None,
            fields: None,
            r: 1,
            conflicts: false,
            use_index: None,
            execution_stats: false,
        }
    }
}

/// A selector plus options, validated once and consumed by one execution.
#[derive(Debug, Clone)]
pub struct FindRequest {
    pub selector: Selector,
    pub options: FindOptions,
}
