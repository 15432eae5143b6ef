//! Total order over stored values.
//!
//! `null < false < true < numbers < strings < arrays < objects`, with anything outside the
//! JSON universe ranked after objects. Index keys use the same comparison, so a range scan
//! over an index returns exactly what the evaluator would accept, already in order.

use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null => 0,
        Bson::Boolean(_) => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) => 3,
        Bson::Array(_) => 4,
        Bson::Document(_) => 5,
        _ => 6,
    }
}

/// JSON type name as accepted by `$type`.
#[must_use]
pub fn json_type_name(v: &Bson) -> &'static str {
    match type_rank(v) {
        0 => "null",
        1 => "boolean",
        2 => "number",
        3 => "string",
        4 => "array",
        5 => "object",
        _ => "other",
    }
}

fn as_i64(v: &Bson) -> Option<i64> {
    match v {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(v: &Bson) -> f64 {
    match v {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Integer as `i64` when the value is integral, from either representation.
#[must_use]
pub fn integral(v: &Bson) -> Option<i64> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    match v {
        Bson::Double(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
            Some(*f as i64)
        }
        other => as_i64(other),
    }
}

/// 2^63 as a double; every double in `[-2^63, 2^63)` floors to an exact `i64`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer with a double. NaN ranks above every number, as in
/// `OrderedFloat`.
#[allow(clippy::cast_possible_truncation)]
fn compare_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let floor = f.floor();
    match i.cmp(&(floor as i64)) {
        Ordering::Equal if f > floor => Ordering::Less,
        ord => ord,
    }
}

fn compare_numbers(a: &Bson, b: &Bson) -> Ordering {
    match (as_i64(a), as_i64(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(x), None) => compare_int_float(x, as_f64(b)),
        (None, Some(y)) => compare_int_float(y, as_f64(a)).reverse(),
        (None, None) => OrderedFloat(as_f64(a)).cmp(&OrderedFloat(as_f64(b))),
    }
}

fn compare_arrays(a: &[Bson], b: &[Bson]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = compare_values(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_documents(a: &BsonDocument, b: &BsonDocument) -> Ordering {
    let mut xs: Vec<(&String, &Bson)> = a.iter().collect();
    let mut ys: Vec<(&String, &Bson)> = b.iter().collect();
    xs.sort_by(|l, r| l.0.cmp(r.0));
    ys.sort_by(|l, r| l.0.cmp(r.0));
    for ((kx, vx), (ky, vy)) in xs.iter().zip(&ys) {
        let ord = kx.cmp(ky).then_with(|| compare_values(vx, vy));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    xs.len().cmp(&ys.len())
}

/// Compares two values under the collation shared by the evaluator and the indexes.
#[must_use]
pub fn compare_values(a: &Bson, b: &Bson) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Bson::Null, Bson::Null) => Ordering::Equal,
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Array(x), Bson::Array(y)) => compare_arrays(x, y),
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        _ if ra == 2 => compare_numbers(a, b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Equality: same type and value, numbers by numeric value.
#[must_use]
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    compare_values(a, b) == Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, doc};

    #[test]
    fn type_order_is_null_bool_number_string_array_object() {
        let ladder = [
            Bson::Null,
            Bson::Boolean(false),
            Bson::Boolean(true),
            Bson::Int32(-5),
            Bson::Double(2.5),
            Bson::Int64(3),
            Bson::String(String::new()),
            Bson::String("a".into()),
            bson!([]),
            bson!([1]),
            bson!({}),
        ];
        for w in ladder.windows(2) {
            assert_eq!(compare_values(&w[0], &w[1]), Ordering::Less, "{} < {}", w[0], w[1]);
            assert_eq!(compare_values(&w[1], &w[0]), Ordering::Greater);
        }
    }

    #[test]
    fn numbers_compare_by_value_across_representations() {
        assert!(values_equal(&Bson::Int32(1), &Bson::Double(1.0)));
        assert!(values_equal(&Bson::Int64(7), &Bson::Int32(7)));
        assert!(values_equal(&Bson::Double(0.0), &Bson::Double(-0.0)));
        assert!(!values_equal(&Bson::Int32(1), &Bson::Boolean(true)));
        assert!(!values_equal(&Bson::String("1".into()), &Bson::Int32(1)));
        assert_eq!(compare_values(&Bson::Int64(i64::MAX), &Bson::Int64(i64::MAX - 1)), Ordering::Greater);
    }

    #[test]
    fn integers_and_doubles_compare_exactly_past_2_pow_53() {
        let two53: i64 = 1 << 53;
        #[allow(clippy::cast_precision_loss)]
        let d = Bson::Double(two53 as f64);
        assert_eq!(compare_values(&Bson::Int64(two53 + 1), &d), Ordering::Greater);
        assert_eq!(compare_values(&d, &Bson::Int64(two53 + 1)), Ordering::Less);
        assert_eq!(compare_values(&Bson::Int64(two53 - 1), &d), Ordering::Less);
        assert!(values_equal(&Bson::Int64(two53), &d));
        assert!(!values_equal(&Bson::Int64(two53 + 1), &d));
        assert_eq!(compare_values(&Bson::Int64(i64::MAX), &Bson::Double(9.3e18)), Ordering::Less);
        assert_eq!(compare_values(&Bson::Int64(i64::MIN), &Bson::Double(-9.3e18)), Ordering::Greater);
        assert!(values_equal(&Bson::Int64(i64::MIN), &Bson::Double(-9_223_372_036_854_775_808.0)));
        assert_eq!(compare_values(&Bson::Int32(2), &Bson::Double(2.5)), Ordering::Less);
        assert_eq!(compare_values(&Bson::Int32(-3), &Bson::Double(-2.5)), Ordering::Less);
        assert_eq!(compare_values(&Bson::Int32(-2), &Bson::Double(-2.5)), Ordering::Greater);
        assert_eq!(compare_values(&Bson::Int64(i64::MAX), &Bson::Double(f64::NAN)), Ordering::Less);
        assert_eq!(compare_values(&Bson::Double(f64::INFINITY), &Bson::Int64(i64::MAX)), Ordering::Greater);
    }

    #[test]
    fn arrays_compare_elementwise_then_length() {
        assert_eq!(compare_values(&bson!([1, 2]), &bson!([1, 3])), Ordering::Less);
        assert_eq!(compare_values(&bson!([1, 2]), &bson!([1, 2, 0])), Ordering::Less);
        assert_eq!(compare_values(&bson!([2]), &bson!([1, 9, 9])), Ordering::Greater);
    }

    #[test]
    fn documents_compare_by_sorted_keys() {
        let a = Bson::Document(doc! {"b": 1, "a": 2});
        let b = Bson::Document(doc! {"a": 2, "b": 1});
        assert!(values_equal(&a, &b));
        let c = Bson::Document(doc! {"a": 2, "c": 0});
        assert_eq!(compare_values(&a, &c), Ordering::Less);
    }

    #[test]
    fn integral_accepts_whole_doubles() {
        assert_eq!(integral(&Bson::Double(4.0)), Some(4));
        assert_eq!(integral(&Bson::Double(4.5)), None);
        assert_eq!(integral(&Bson::Int32(-3)), Some(-3));
        assert_eq!(integral(&Bson::String("4".into())), None);
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&Bson::Null), "null");
        assert_eq!(json_type_name(&Bson::Int64(1)), "number");
        assert_eq!(json_type_name(&bson!({"a": 1})), "object");
    }
}
