use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};
use serde::{Serialize, Serializer};
use std::fmt;

use super::types::MAX_PATH_DEPTH;

/// Dotted address into a document. `\.` keeps a literal dot inside a segment.
///
/// A segment that is a base-10 non-negative integer indexes into an array parent; under
/// a document parent it is an ordinary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// # Errors
    /// Returns `DbError::InvalidFieldPath` for empty paths, empty segments, or paths deeper
    /// than the supported depth.
    pub fn parse(raw: &str) -> Result<Self, DbError> {
        if raw.is_empty() {
            return Err(DbError::InvalidFieldPath("field path must not be empty".into()));
        }
        let mut segments = Vec::new();
        let mut cur = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(next) => cur.push(next),
                    None => cur.push('\\'),
                },
                '.' => segments.push(std::mem::take(&mut cur)),
                other => cur.push(other),
            }
        }
        segments.push(cur);
        if segments.iter().any(String::is_empty) {
            return Err(DbError::InvalidFieldPath(format!("empty segment in `{raw}`")));
        }
        if segments.len() > MAX_PATH_DEPTH {
            return Err(DbError::InvalidFieldPath(format!(
                "`{raw}` is deeper than {MAX_PATH_DEPTH} segments"
            )));
        }
        Ok(Self { segments })
    }

    /// The empty path: the value being matched itself (inside `$elemMatch`).
    #[must_use]
    pub const fn root() -> Self {
        Self { segments: Vec::new() }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Appends one literal segment; dots in `segment` are not separators.
    #[must_use]
    pub fn join_segment(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&seg.replace('\\', "\\\\").replace('.', "\\."))?;
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn array_index(seg: &str) -> Option<usize> {
    if seg.bytes().all(|b| b.is_ascii_digit()) { seg.parse::<usize>().ok() } else { None }
}

fn step<'a>(cur: &'a Bson, seg: &str) -> Option<&'a Bson> {
    match cur {
        Bson::Document(d) => d.get(seg),
        Bson::Array(items) => array_index(seg).and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Resolves `path` against a document. `None` is MISSING, distinct from a stored `null`.
#[must_use]
pub fn resolve<'a>(doc: &'a BsonDocument, path: &FieldPath) -> Option<&'a Bson> {
    let (first, rest) = path.segments.split_first()?;
    let mut cur = doc.get(first)?;
    for seg in rest {
        cur = step(cur, seg)?;
    }
    Some(cur)
}

/// Resolves `path` against an arbitrary value; the root path yields the value itself.
#[must_use]
pub fn resolve_value<'a>(value: &'a Bson, path: &FieldPath) -> Option<&'a Bson> {
    let mut cur = value;
    for seg in &path.segments {
        cur = step(cur, seg)?;
    }
    Some(cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn p(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn resolves_nested_keys_and_array_indices() {
        let d = doc! {"location": {"city": "Longbranch"}, "favorites": ["C", "Lisp", {"x": 1}]};
        assert_eq!(resolve(&d, &p("location.city")), Some(&Bson::String("Longbranch".into())));
        assert_eq!(resolve(&d, &p("favorites.1")), Some(&Bson::String("Lisp".into())));
        assert_eq!(resolve(&d, &p("favorites.2.x")), Some(&Bson::Int32(1)));
    }

    #[test]
    fn missing_is_distinct_from_null() {
        let d = doc! {"twitter": null, "favorites": ["a"], "n": 5};
        assert_eq!(resolve(&d, &p("twitter")), Some(&Bson::Null));
        assert_eq!(resolve(&d, &p("facebook")), None);
        assert_eq!(resolve(&d, &p("favorites.3")), None);
        assert_eq!(resolve(&d, &p("favorites.x")), None);
        assert_eq!(resolve(&d, &p("n.0")), None);
        assert_eq!(resolve(&d, &p("twitter.handle")), None);
    }

    #[test]
    fn numeric_segment_is_a_key_under_documents() {
        let d = doc! {"m": {"3": "three"}};
        assert_eq!(resolve(&d, &p("m.3")), Some(&Bson::String("three".into())));
    }

    #[test]
    fn escaped_dots_stay_in_segment() {
        let path = p("a\\.b.c");
        assert_eq!(path.segments(), &["a.b".to_string(), "c".to_string()][..]);
        assert_eq!(path.to_string(), "a\\.b.c");
        let d = doc! {"a.b": {"c": true}};
        assert_eq!(resolve(&d, &path), Some(&Bson::Boolean(true)));
    }

    #[test]
    fn backslashes_survive_display_and_reparse() {
        let path = p("a\\\\.b");
        assert_eq!(path.segments(), &["a\\".to_string(), "b".to_string()][..]);
        assert_eq!(path.to_string(), "a\\\\.b");
        for seg in ["a\\", "x\\.y", "\\", "a.b\\c"] {
            let path = FieldPath::root().join_segment(seg).join_segment("z");
            assert_eq!(p(&path.to_string()), path, "{seg}");
        }
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
        let deep = vec!["x"; MAX_PATH_DEPTH + 1].join(".");
        assert!(FieldPath::parse(&deep).is_err());
    }

    #[test]
    fn root_path_resolves_to_value() {
        let v = Bson::Int32(3);
        assert_eq!(resolve_value(&v, &FieldPath::root()), Some(&v));
        assert_eq!(resolve(&doc! {"a": 1}, &FieldPath::root()), None);
    }
}
