use crate::errors::DbError;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};

pub const ID_FIELD: &str = "_id";
pub const REV_FIELD: &str = "_rev";
pub const CONFLICTS_FIELD: &str = "_conflicts";

/// A stored document: the body plus the bits the find engine reads outside of it.
///
/// The body always carries `_id` as a string so that selectors, sorts and the primary
/// index see the same key as `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
    /// Revisions that lost conflict resolution; surfaced only when a find asks for them.
    pub conflicts: Vec<String>,
}

impl Document {
    /// Wraps a body, assigning a random `_id` when the body has none.
    ///
    /// # Errors
    /// Returns `DbError::InvalidDocument` if `_id` is present but is not a non-empty string.
    pub fn new(mut data: BsonDocument) -> Result<Self, DbError> {
        let id = match data.get(ID_FIELD) {
            Some(Bson::String(s)) if !s.is_empty() => DocumentId(s.clone()),
            Some(other) => {
                return Err(DbError::InvalidDocument(format!(
                    "`_id` must be a non-empty string, got {other}"
                )));
            }
            None => {
                let id = DocumentId::new();
                data.insert(ID_FIELD, id.as_str());
                id
            }
        };
        Ok(Self { id, data, conflicts: Vec::new() })
    }

    /// Parses a JSON object into a document.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, is not an object, or has a bad `_id`.
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        let data = crate::utils::json::parse_json_to_bson_document(json)
            .map_err(|e| DbError::InvalidDocument(e.to_string()))?;
        Self::new(data)
    }

    #[must_use]
    pub fn with_conflicts(mut self, conflicts: Vec<String>) -> Self {
        self.conflicts = conflicts;
        self
    }

    #[must_use]
    pub fn rev(&self) -> Option<&str> {
        match self.data.get(REV_FIELD) {
            Some(Bson::String(s)) => Some(s),
            _ => None,
        }
    }
}
