use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::path::{FieldPath, resolve, resolve_value};
use super::types::{CmpOp, Combinator, Condition, Direction, Node, Selector, SortSpec};
use super::value::{compare_values, json_type_name, values_equal};

/// What a field path is resolved against: a whole document, or one array element
/// inside `$elemMatch`.
#[derive(Clone, Copy)]
enum Target<'a> {
    Doc(&'a BsonDocument),
    Value(&'a Bson),
}

impl<'a> Target<'a> {
    fn get(self, path: &FieldPath) -> Option<&'a Bson> {
        match self {
            Self::Doc(d) => resolve(d, path),
            Self::Value(v) => resolve_value(v, path),
        }
    }
}

/// True when `doc` satisfies `selector`. Total over arbitrary documents: structural
/// mismatches resolve to MISSING instead of failing.
#[must_use]
pub fn matches(doc: &BsonDocument, selector: &Selector) -> bool {
    eval_node(Target::Doc(doc), selector.root())
}

fn eval_node(t: Target<'_>, node: &Node) -> bool {
    match node {
        Node::Combination { kind: Combinator::And, children } => {
            children.iter().all(|c| eval_node(t, c))
        }
        Node::Combination { kind: Combinator::Or, children } => {
            children.iter().any(|c| eval_node(t, c))
        }
        Node::Combination { kind: Combinator::Nor, children } => {
            !children.iter().any(|c| eval_node(t, c))
        }
        Node::Not(child) => !eval_node(t, child),
        Node::Field { path, cond } => eval_cond(t.get(path), cond),
    }
}

/// Whole-value membership; an array field matches only an equal array in the set.
fn is_in(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|s| values_equal(v, s))
}

fn eval_cmp(v: &Bson, op: CmpOp, operand: &Bson) -> bool {
    let ord = compare_values(v, operand);
    match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Gte => ord != Ordering::Less,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Lte => ord != Ordering::Greater,
    }
}

fn eval_cond(v: Option<&Bson>, cond: &Condition) -> bool {
    match cond {
        // absence is "not equal"
        Condition::Cmp { op: CmpOp::Ne, value } => v.is_none_or(|x| !values_equal(x, value)),
        Condition::Cmp { op, value } => v.is_some_and(|x| eval_cmp(x, *op, value)),
        Condition::Exists(want) => v.is_some() == *want,
        Condition::Type(name) => v.is_some_and(|x| json_type_name(x) == *name),
        Condition::In(set) => v.is_some_and(|x| is_in(x, set)),
        Condition::Nin(set) => v.is_none_or(|x| !is_in(x, set)),
        Condition::Size(n) => matches!(v, Some(Bson::Array(items)) if items.len() == *n),
        Condition::Mod { divisor, remainder } => match v {
            Some(Bson::Int32(i)) => i64::from(*i).checked_rem(*divisor) == Some(*remainder),
            Some(Bson::Int64(i)) => i.checked_rem(*divisor) == Some(*remainder),
            _ => false,
        },
        Condition::All(wanted) => match v {
            Some(Bson::Array(items)) if !wanted.is_empty() => {
                wanted.iter().all(|w| items.iter().any(|i| values_equal(i, w)))
            }
            _ => false,
        },
        Condition::ElemMatch(inner) => match v {
            Some(Bson::Array(items)) => items.iter().any(|i| eval_node(Target::Value(i), inner)),
            _ => false,
        },
        #[cfg(feature = "regex")]
        Condition::Regex(re) => matches!(v, Some(Bson::String(s)) if re.is_match(s)),
    }
}

/// Orders two documents by the sort fields; MISSING sorts before every value.
#[must_use]
pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &SortSpec) -> Ordering {
    for path in &sort.fields {
        let ord = match (resolve(a, path), resolve(b, path)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return match sort.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}

fn copy_path(src: &BsonDocument, segs: &[String], dst: &mut BsonDocument) -> bool {
    let Some((first, rest)) = segs.split_first() else { return false };
    let Some(v) = src.get(first) else { return false };
    if rest.is_empty() {
        dst.insert(first.clone(), v.clone());
        return true;
    }
    // only mappings are traversed; array positions are not projected
    let Bson::Document(inner) = v else { return false };
    let mut child = match dst.get(first) {
        Some(Bson::Document(d)) => d.clone(),
        _ => BsonDocument::new(),
    };
    if copy_path(inner, rest, &mut child) {
        dst.insert(first.clone(), child);
        true
    } else {
        false
    }
}

/// Keeps only the listed paths, with the nested mappings that contain them.
#[must_use]
pub fn project_fields(doc: &BsonDocument, fields: &[FieldPath]) -> BsonDocument {
    let mut out = BsonDocument::new();
    for path in fields {
        copy_path(doc, path.segments(), &mut out);
    }
    out
}
