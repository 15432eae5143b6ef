use crate::document::Document;
use crate::errors::DbError;
use crate::index::{BTreeIndex, IndexCatalog, IndexDefinition, ScanRange};
use crate::query::{DocumentSource, Direction};
use crate::types::DocumentId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable view of a collection: documents, catalog, and one index per catalog entry.
#[derive(Debug, Clone)]
pub struct CollectionState {
    pub(crate) docs: HashMap<DocumentId, Document>,
    pub(crate) catalog: IndexCatalog,
    pub(crate) indexes: HashMap<String, BTreeIndex>,
}

impl Default for CollectionState {
    fn default() -> Self {
        let catalog = IndexCatalog::new();
        let primary = catalog.primary().clone();
        let mut indexes = HashMap::new();
        indexes.insert(primary.name.clone(), BTreeIndex::new(primary));
        Self { docs: HashMap::new(), catalog, indexes }
    }
}

impl CollectionState {
    #[must_use]
    pub const fn catalog(&self) -> &IndexCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.docs.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&BTreeIndex> {
        self.indexes.get(name)
    }

    /// Inserts or replaces a document, keeping every index in step.
    pub(crate) fn put(&mut self, doc: Document) -> Option<Document> {
        let old = self.docs.remove(&doc.id);
        if let Some(old) = &old {
            for idx in self.indexes.values_mut() {
                idx.remove(old);
            }
        }
        for idx in self.indexes.values_mut() {
            idx.insert(&doc);
        }
        self.docs.insert(doc.id.clone(), doc);
        old
    }

    pub(crate) fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let old = self.docs.remove(id)?;
        for idx in self.indexes.values_mut() {
            idx.remove(&old);
        }
        Some(old)
    }
}

impl DocumentSource for CollectionState {
    fn scan<'a>(
        &'a self,
        index: &IndexDefinition,
        range: &ScanRange,
        direction: Direction,
        read_quorum: u32,
    ) -> Result<Box<dyn Iterator<Item = &'a Document> + 'a>, DbError> {
        let idx = self
            .indexes
            .get(&index.name)
            .ok_or_else(|| DbError::NoSuchIndex(index.name.clone()))?;
        if read_quorum > 1 {
            log::debug!(target: "mangolite::query", "r={read_quorum} served by the single local copy");
        }
        Ok(Box::new(idx.scan(range, direction).filter_map(move |id| self.docs.get(id))))
    }
}

/// A named collection. Writers copy the state on write; a find holds an `Arc` snapshot
/// for its whole run and never sees a concurrent write.
pub struct Collection {
    name: String,
    state: RwLock<Arc<CollectionState>>,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: RwLock::new(Arc::new(CollectionState::default())) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state; cheap, and stable for as long as the caller holds it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CollectionState> {
        self.state.read().clone()
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut CollectionState) -> R) -> R {
        let mut guard = self.state.write();
        f(Arc::make_mut(&mut guard))
    }
}
