use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};

use super::path::FieldPath;
use super::types::{CmpOp, Combinator, Condition, MAX_SELECTOR_DEPTH, Node, Selector};
use super::value::{integral, json_type_name};

const FIELD_OPERATORS: &[&str] = &[
    "$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$exists", "$type", "$in", "$nin", "$size",
    "$mod", "$all", "$elemMatch", "$regex",
];

const TYPE_NAMES: &[&str] = &["null", "boolean", "number", "string", "array", "object"];

impl Selector {
    /// Validates and normalizes a selector.
    ///
    /// # Errors
    /// Returns a client-input error if the root is not an object, an operator is unknown,
    /// an operand has the wrong shape, or a field operator appears without a field.
    pub fn parse(value: &Bson) -> Result<Self, DbError> {
        let Bson::Document(doc) = value else {
            return Err(DbError::InvalidSelector(format!(
                "selector must be a JSON object, got {}",
                json_type_name(value)
            )));
        };
        Ok(Self { root: parse_object(doc, 0)? })
    }

    /// # Errors
    /// Returns an error if the JSON is malformed or the selector is invalid.
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::parse(&crate::utils::json::json_to_bson(&value))
    }
}

fn check_depth(depth: usize) -> Result<(), DbError> {
    if depth > MAX_SELECTOR_DEPTH {
        return Err(DbError::InvalidSelector(format!(
            "selector nesting exceeds {MAX_SELECTOR_DEPTH} levels"
        )));
    }
    Ok(())
}

fn conjoin(mut parts: Vec<Node>) -> Node {
    if parts.len() == 1 {
        return parts.remove(0);
    }
    Node::Combination { kind: Combinator::And, children: parts }
}

fn combinator(op: &str) -> Option<Combinator> {
    match op {
        "$and" => Some(Combinator::And),
        "$or" => Some(Combinator::Or),
        "$nor" => Some(Combinator::Nor),
        _ => None,
    }
}

fn operand_objects<'a>(op: &str, operand: &'a Bson) -> Result<Vec<&'a BsonDocument>, DbError> {
    let Bson::Array(items) = operand else {
        return Err(DbError::InvalidOperator(format!("`{op}` requires an array of selectors")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            other => Err(DbError::InvalidSelector(format!(
                "`{op}` arguments must be objects, got {}",
                json_type_name(other)
            ))),
        })
        .collect()
}

fn unknown_or_misplaced(op: &str) -> DbError {
    if FIELD_OPERATORS.contains(&op) {
        DbError::InvalidOperator(format!("`{op}` must be applied to a field"))
    } else {
        DbError::InvalidOperator(format!("unknown operator `{op}`"))
    }
}

/// Selector-level object: keys are combinators or field paths.
fn parse_object(doc: &BsonDocument, depth: usize) -> Result<Node, DbError> {
    check_depth(depth)?;
    let mut parts = Vec::with_capacity(doc.len());
    for (key, val) in doc {
        if let Some(kind) = combinator(key) {
            let children = operand_objects(key, val)?
                .into_iter()
                .map(|d| parse_object(d, depth + 1))
                .collect::<Result<_, _>>()?;
            parts.push(Node::Combination { kind, children });
        } else if key == "$not" {
            let Bson::Document(inner) = val else {
                return Err(DbError::InvalidOperator("`$not` requires a selector object".into()));
            };
            parts.push(Node::Not(Box::new(parse_object(inner, depth + 1)?)));
        } else if key.starts_with('$') {
            return Err(unknown_or_misplaced(key));
        } else {
            let path = FieldPath::parse(key)?;
            parts.push(parse_field(&path, val, depth + 1)?);
        }
    }
    Ok(conjoin(parts))
}

/// Field-level value: operators on `path`, nested sub-fields, or an implicit `$eq`.
fn parse_field(path: &FieldPath, val: &Bson, depth: usize) -> Result<Node, DbError> {
    check_depth(depth)?;
    let Bson::Document(doc) = val else {
        return Ok(Node::Field {
            path: path.clone(),
            cond: Condition::Cmp { op: CmpOp::Eq, value: val.clone() },
        });
    };
    if doc.is_empty() {
        return Ok(Node::Field {
            path: path.clone(),
            cond: Condition::Cmp { op: CmpOp::Eq, value: val.clone() },
        });
    }
    let mut parts = Vec::with_capacity(doc.len());
    for (key, operand) in doc {
        if key.starts_with('$') {
            parts.push(parse_operator(path, key, operand, depth)?);
        } else {
            let sub = path.join(&FieldPath::parse(key)?);
            parts.push(parse_field(&sub, operand, depth + 1)?);
        }
    }
    Ok(conjoin(parts))
}

fn field(path: &FieldPath, cond: Condition) -> Node {
    Node::Field { path: path.clone(), cond }
}

fn array_operand<'a>(op: &str, operand: &'a Bson) -> Result<&'a [Bson], DbError> {
    match operand {
        Bson::Array(items) => Ok(items),
        other => Err(DbError::InvalidOperator(format!(
            "`{op}` requires an array, got {}",
            json_type_name(other)
        ))),
    }
}

fn parse_operator(
    path: &FieldPath,
    op: &str,
    operand: &Bson,
    depth: usize,
) -> Result<Node, DbError> {
    let cmp = |cmp_op: CmpOp| -> Result<Node, DbError> {
        Ok(field(path, Condition::Cmp { op: cmp_op, value: operand.clone() }))
    };
    match op {
        "$eq" => cmp(CmpOp::Eq),
        "$ne" => cmp(CmpOp::Ne),
        "$gt" => cmp(CmpOp::Gt),
        "$gte" => cmp(CmpOp::Gte),
        "$lt" => cmp(CmpOp::Lt),
        "$lte" => cmp(CmpOp::Lte),
        "$exists" => match operand {
            Bson::Boolean(b) => Ok(field(path, Condition::Exists(*b))),
            _ => Err(DbError::InvalidOperator("`$exists` requires a boolean".into())),
        },
        "$type" => match operand {
            Bson::String(s) => TYPE_NAMES
                .iter()
                .find(|t| **t == s.as_str())
                .map(|t| field(path, Condition::Type(*t)))
                .ok_or_else(|| DbError::InvalidOperator(format!("unknown `$type` name `{s}`"))),
            _ => Err(DbError::InvalidOperator("`$type` requires a type name string".into())),
        },
        "$in" => Ok(field(path, Condition::In(array_operand(op, operand)?.to_vec()))),
        "$nin" => Ok(field(path, Condition::Nin(array_operand(op, operand)?.to_vec()))),
        "$all" => Ok(field(path, Condition::All(array_operand(op, operand)?.to_vec()))),
        "$size" => match operand {
            Bson::Int32(_) | Bson::Int64(_) => integral(operand)
                .and_then(crate::utils::num::i64_to_usize)
                .map(|n| field(path, Condition::Size(n)))
                .ok_or_else(|| {
                    DbError::InvalidOperator("`$size` requires a non-negative integer".into())
                }),
            _ => Err(DbError::InvalidOperator("`$size` requires a non-negative integer".into())),
        },
        "$mod" => parse_mod(path, operand),
        "$elemMatch" => match operand {
            Bson::Document(_) => {
                let inner = parse_field(&FieldPath::root(), operand, depth + 1)?;
                Ok(field(path, Condition::ElemMatch(Box::new(inner))))
            }
            _ => Err(DbError::InvalidOperator("`$elemMatch` requires an object".into())),
        },
        "$regex" => parse_regex(path, operand),
        "$and" | "$or" | "$nor" => {
            let kind = combinator(op).ok_or_else(|| unknown_or_misplaced(op))?;
            let children = operand_objects(op, operand)?
                .into_iter()
                .map(|d| parse_field(path, &Bson::Document(d.clone()), depth + 1))
                .collect::<Result<_, _>>()?;
            Ok(Node::Combination { kind, children })
        }
        "$not" => match operand {
            Bson::Document(_) => Ok(Node::Not(Box::new(parse_field(path, operand, depth + 1)?))),
            _ => Err(DbError::InvalidOperator("`$not` requires an object".into())),
        },
        other => Err(DbError::InvalidOperator(format!("unknown operator `{other}`"))),
    }
}

fn parse_mod(path: &FieldPath, operand: &Bson) -> Result<Node, DbError> {
    let bad = || DbError::InvalidOperator("`$mod` requires [divisor, remainder] integers".into());
    let items = array_operand("$mod", operand)?;
    let [d, r] = items else { return Err(bad()) };
    let is_int = |v: &Bson| matches!(v, Bson::Int32(_) | Bson::Int64(_));
    if !is_int(d) || !is_int(r) {
        return Err(bad());
    }
    let (Some(divisor), Some(remainder)) = (integral(d), integral(r)) else { return Err(bad()) };
    if divisor == 0 {
        return Err(DbError::InvalidOperator("`$mod` divisor must not be zero".into()));
    }
    Ok(field(path, Condition::Mod { divisor, remainder }))
}

#[cfg(feature = "regex")]
fn parse_regex(path: &FieldPath, operand: &Bson) -> Result<Node, DbError> {
    let Bson::String(pattern) = operand else {
        return Err(DbError::InvalidOperator("`$regex` requires a pattern string".into()));
    };
    let re = regex::RegexBuilder::new(pattern)
        .size_limit(1 << 20)
        .build()
        .map_err(|e| DbError::InvalidOperator(format!("bad `$regex` pattern: {e}")))?;
    Ok(field(path, Condition::Regex(re)))
}

#[cfg(not(feature = "regex"))]
fn parse_regex(_path: &FieldPath, _operand: &Bson) -> Result<Node, DbError> {
    Err(DbError::InvalidOperator("`$regex` requires the `regex` feature".into()))
}
