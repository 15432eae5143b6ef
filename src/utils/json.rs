use bson::{Bson, Document as BsonDocument};
use serde_json::{Map, Number, Value};
use std::io;

/// Convert a JSON value into BSON, keeping integer and float literals apart:
/// integers become `Int32`/`Int64`, anything else numeric becomes `Double`.
#[must_use]
pub fn json_to_bson(val: &Value) -> Bson {
    match val {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => number_to_bson(n),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(map_to_document(map)),
    }
}

fn number_to_bson(n: &Number) -> Bson {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32);
    }
    // u64 beyond i64 range and real floats
    Bson::Double(n.as_f64().unwrap_or(f64::NAN))
}

fn map_to_document(map: &Map<String, Value>) -> BsonDocument {
    let mut out = BsonDocument::new();
    for (k, v) in map {
        out.insert(k.clone(), json_to_bson(v));
    }
    out
}

/// Convert BSON back into plain JSON (no extended-JSON wrappers).
#[must_use]
pub fn bson_to_json(val: &Bson) -> Value {
    match val {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(d) => document_to_json(d),
        other => Value::String(other.to_string()),
    }
}

#[must_use]
pub fn document_to_json(doc: &BsonDocument) -> Value {
    let mut out = Map::new();
    for (k, v) in doc {
        out.insert(k.clone(), bson_to_json(v));
    }
    Value::Object(out)
}

/// Convert a serde_json::Value that must be an object into a bson::Document.
/// Returns io::Error with InvalidData on malformed input.
pub fn json_value_to_bson_document(val: &Value) -> io::Result<BsonDocument> {
    let obj = val
        .as_object()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "expected JSON object"))?;
    Ok(map_to_document(obj))
}

/// Parse a JSON string into a bson::Document. The JSON must be a top-level object.
pub fn parse_json_to_bson_document(json: &str) -> io::Result<BsonDocument> {
    let val: Value =
        serde_json::from_str(json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    json_value_to_bson_document(&val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_bson_success() {
        let d = parse_json_to_bson_document("{\"a\":1,\"b\":\"x\"}").unwrap();
        assert_eq!(d.get_i32("a").unwrap(), 1);
        assert_eq!(d.get_str("b").unwrap(), "x");
    }

    #[test]
    fn json_to_bson_rejects_array() {
        let e = parse_json_to_bson_document("[1,2,3]").unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn numbers_keep_integer_and_float_apart() {
        let v: Value = serde_json::from_str("[2, 2.0, 5000000000, 1e3]").unwrap();
        let Bson::Array(items) = json_to_bson(&v) else { panic!("expected array") };
        assert_eq!(items[0], Bson::Int32(2));
        assert_eq!(items[1], Bson::Double(2.0));
        assert_eq!(items[2], Bson::Int64(5_000_000_000));
        assert_eq!(items[3], Bson::Double(1000.0));
    }

    #[test]
    fn bson_round_trips_to_plain_json() {
        let v: Value = serde_json::from_str(r#"{"a":{"b":[1,null,true,"s"]},"c":1.5}"#).unwrap();
        let back = bson_to_json(&json_to_bson(&v));
        assert_eq!(back, v);
    }
}
