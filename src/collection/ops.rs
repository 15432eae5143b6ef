use super::core::Collection;
use crate::config::FindConfig;
use crate::document::Document;
use crate::errors::DbError;
use crate::find::{self, FindResult};
use crate::query::{ExplainReport, FindRequest};
use crate::types::DocumentId;

impl Collection {
    /// Inserts or replaces by `_id`; returns the replaced document.
    pub fn insert_document(&self, document: Document) -> Option<Document> {
        let id = document.id.clone();
        let old = self.write(|s| s.put(document));
        log::debug!(target: "mangolite::query", "{}: put {id}", self.name());
        old
    }

    pub fn insert_many(&self, documents: impl IntoIterator<Item = Document>) -> usize {
        self.write(|s| documents.into_iter().map(|d| s.put(d)).count())
    }

    /// Parses each JSON object and inserts it.
    ///
    /// # Errors
    /// Returns the first document that fails to parse; nothing is inserted in that case.
    pub fn insert_json<'a>(&self, bodies: impl IntoIterator<Item = &'a str>) -> Result<usize, DbError> {
        let docs = bodies.into_iter().map(Document::from_json).collect::<Result<Vec<_>, _>>()?;
        Ok(self.insert_many(docs))
    }

    #[must_use]
    pub fn find_document(&self, id: &DocumentId) -> Option<Document> {
        self.snapshot().get(id).cloned()
    }

    pub fn delete_document(&self, id: &DocumentId) -> Option<Document> {
        self.write(|s| s.remove(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Runs a validated request against the current snapshot.
    ///
    /// # Errors
    /// Propagates source errors from execution.
    pub fn find(&self, request: &FindRequest, cfg: &FindConfig) -> Result<FindResult, DbError> {
        let snap = self.snapshot();
        find::find(snap.as_ref(), snap.catalog(), request, cfg)
    }

    #[must_use]
    pub fn explain(&self, request: &FindRequest, cfg: &FindConfig) -> ExplainReport {
        find::explain(self.snapshot().catalog(), request, cfg)
    }
}
