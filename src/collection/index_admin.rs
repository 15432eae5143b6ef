use super::core::Collection;
use crate::errors::DbError;
use crate::index::{BTreeIndex, IndexDefinition, IndexStats};
use crate::query::FieldPath;
use serde::Serialize;

/// Catalog entry plus its live statistics, as listed by `list_indexes`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    #[serde(flatten)]
    pub def: IndexDefinition,
    pub stats: IndexStats,
}

impl Collection {
    // --- Index admin helpers ---

    /// Declares a compound index and builds it over the current documents.
    ///
    /// # Errors
    /// `InvalidFieldPath` for a bad field, `IndexAlreadyExists` for a duplicate name or
    /// field list.
    pub fn create_index(&self, fields: &[&str], name: Option<&str>) -> Result<IndexDefinition, DbError> {
        let fields = fields.iter().map(|f| FieldPath::parse(f)).collect::<Result<Vec<_>, _>>()?;
        let name = name.map_or_else(|| IndexDefinition::default_name(&fields), str::to_string);
        let def = IndexDefinition::new(name, fields);
        self.write(|s| {
            s.catalog.add(def.clone())?;
            let idx = BTreeIndex::build(def.clone(), s.docs.values());
            log::info!(
                target: "mangolite::query",
                "{}: built index {} over {} docs in {}ms",
                self.name(),
                def.name,
                idx.stats.entries,
                idx.stats.build_time_ms
            );
            s.indexes.insert(def.name.clone(), idx);
            Ok(def)
        })
    }

    /// # Errors
    /// `NoSuchIndex` for unknown names; the primary index cannot be deleted.
    pub fn delete_index(&self, name: &str) -> Result<(), DbError> {
        self.write(|s| {
            s.catalog.remove(name)?;
            s.indexes.remove(name);
            Ok(())
        })
    }

    /// Indexes in declaration order, primary first.
    #[must_use]
    pub fn list_indexes(&self) -> Vec<IndexInfo> {
        let snap = self.snapshot();
        snap.catalog()
            .list()
            .iter()
            .map(|def| IndexInfo {
                def: def.clone(),
                stats: snap.index(&def.name).map(|i| i.stats.clone()).unwrap_or_default(),
            })
            .collect()
    }
}
