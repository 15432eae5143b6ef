use crate::document::Document;
use crate::query::types::Direction;
use crate::types::DocumentId;
use serde::Serialize;
use std::collections::BTreeSet;

use super::catalog::IndexDefinition;
use super::key::{IndexEntry, IndexKey, ScanRange};

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub build_time_ms: u128,
}

/// Ordered compound index. Every document has exactly one entry, absent fields included.
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub def: IndexDefinition,
    entries: BTreeSet<IndexEntry>,
    pub stats: IndexStats,
}

impl BTreeIndex {
    #[must_use]
    pub fn new(def: IndexDefinition) -> Self {
        Self { def, entries: BTreeSet::new(), stats: IndexStats::default() }
    }

    /// Builds the index over existing documents, recording the build time.
    pub fn build<'a>(def: IndexDefinition, docs: impl Iterator<Item = &'a Document>) -> Self {
        let start = std::time::Instant::now();
        let mut idx = Self::new(def);
        for doc in docs {
            idx.insert(doc);
        }
        idx.stats.build_time_ms = start.elapsed().as_millis();
        idx
    }

    fn entry(&self, doc: &Document) -> IndexEntry {
        IndexEntry { key: IndexKey::for_document(&doc.data, &self.def.fields), id: doc.id.clone() }
    }

    pub fn insert(&mut self, doc: &Document) {
        if self.entries.insert(self.entry(doc)) {
            self.stats.entries += 1;
        }
    }

    pub fn remove(&mut self, doc: &Document) {
        if self.entries.remove(&self.entry(doc)) {
            self.stats.entries = self.stats.entries.saturating_sub(1);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Document ids in `range`, in key order (then id), reversed for `Desc`.
    pub fn scan<'a>(
        &'a self,
        range: &ScanRange,
        direction: Direction,
    ) -> Box<dyn Iterator<Item = &'a DocumentId> + 'a> {
        if range.is_empty() {
            return Box::new(std::iter::empty());
        }
        let iter = self.entries.range(range.entry_bounds()).map(|e| &e.id);
        match direction {
            Direction::Asc => Box::new(iter),
            Direction::Desc => Box::new(iter.rev()),
        }
    }
}
