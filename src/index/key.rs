use crate::query::path::{FieldPath, resolve};
use crate::query::value::compare_values;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::ops::Bound;

/// One component of a compound index key.
///
/// `Missing` is the key part of a field the document does not have. It sorts before every
/// stored value (including `null`), so absent fields are indexed but never inside a range
/// derived from a comparison. `Max` only appears in scan bounds.
#[derive(Debug, Clone)]
pub enum KeyPart {
    Missing,
    Value(Bson),
    Max,
}

impl KeyPart {
    const fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Value(_) => 1,
            Self::Max => 2,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Missing => json!({"$missing": true}),
            Self::Value(v) => crate::utils::json::bson_to_json(v),
            Self::Max => json!({"$max": true}),
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => compare_values(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

/// A compound key; a shorter key sorts before every key it prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexKey(pub Vec<KeyPart>);

impl IndexKey {
    /// Key of `doc` under the given index fields.
    #[must_use]
    pub fn for_document(doc: &BsonDocument, fields: &[FieldPath]) -> Self {
        Self(
            fields
                .iter()
                .map(|f| resolve(doc, f).map_or(KeyPart::Missing, |v| KeyPart::Value(v.clone())))
                .collect(),
        )
    }

    #[must_use]
    pub fn with(&self, part: KeyPart) -> Self {
        let mut parts = self.0.clone();
        parts.push(part);
        Self(parts)
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().map(KeyPart::to_json).collect())
    }
}

/// A stored index entry. Entries with equal keys are ordered by document id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry {
    pub key: IndexKey,
    pub id: DocumentId,
}

impl IndexEntry {
    /// Seek entry that sorts before every entry whose key equals or extends `key`.
    pub(crate) fn seek(key: IndexKey) -> Self {
        Self { key, id: DocumentId(String::new()) }
    }
}

/// Contiguous key range over one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    pub start: Bound<IndexKey>,
    pub end: Bound<IndexKey>,
}

impl ScanRange {
    #[must_use]
    pub const fn full() -> Self {
        Self { start: Bound::Unbounded, end: Bound::Unbounded }
    }

    /// Every key that starts with `prefix`.
    #[must_use]
    pub fn prefix(prefix: &IndexKey) -> Self {
        Self { start: Bound::Included(prefix.clone()), end: Bound::Excluded(prefix.with(KeyPart::Max)) }
    }

    /// Keys that start with `prefix` and whose next part lies within `lower`/`upper`.
    /// Keys with the next part MISSING are never included.
    #[must_use]
    pub fn bounded(prefix: &IndexKey, lower: &Bound<Bson>, upper: &Bound<Bson>) -> Self {
        let start = match lower {
            Bound::Included(v) => Bound::Included(prefix.with(KeyPart::Value(v.clone()))),
            Bound::Excluded(v) => {
                Bound::Excluded(prefix.with(KeyPart::Value(v.clone())).with(KeyPart::Max))
            }
            Bound::Unbounded => Bound::Excluded(prefix.with(KeyPart::Missing).with(KeyPart::Max)),
        };
        let end = match upper {
            Bound::Included(v) => {
                Bound::Excluded(prefix.with(KeyPart::Value(v.clone())).with(KeyPart::Max))
            }
            Bound::Excluded(v) => Bound::Excluded(prefix.with(KeyPart::Value(v.clone()))),
            Bound::Unbounded => Bound::Excluded(prefix.with(KeyPart::Max)),
        };
        Self { start, end }
    }

    /// True when no key can fall inside the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s) | Bound::Excluded(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e)) => s >= e,
            _ => false,
        }
    }

    pub(crate) fn entry_bounds(&self) -> (Bound<IndexEntry>, Bound<IndexEntry>) {
        let conv = |b: &Bound<IndexKey>| match b {
            Bound::Included(k) => Bound::Included(IndexEntry::seek(k.clone())),
            Bound::Excluded(k) => Bound::Excluded(IndexEntry::seek(k.clone())),
            Bound::Unbounded => Bound::Unbounded,
        };
        (conv(&self.start), conv(&self.end))
    }

    /// `{"start_key", "end_key", "inclusive_start", "inclusive_end"}` for explain output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let side = |b: &Bound<IndexKey>| match b {
            Bound::Included(k) => (k.to_json(), true),
            Bound::Excluded(k) => (k.to_json(), false),
            Bound::Unbounded => (Value::Null, true),
        };
        let (start_key, inclusive_start) = side(&self.start);
        let (end_key, inclusive_end) = side(&self.end);
        json!({
            "start_key": start_key,
            "end_key": end_key,
            "inclusive_start": inclusive_start,
            "inclusive_end": inclusive_end,
        })
    }
}
