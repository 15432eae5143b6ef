use crate::collection::Collection;
use crate::errors::DbError;
use crate::types::CollectionName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named collections.
#[derive(Default)]
pub struct Engine {
    collections: RwLock<HashMap<CollectionName, Arc<Collection>>>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// `CollectionAlreadyExists` if the name is taken, `InvalidRequest` for an empty name.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        if name.is_empty() {
            return Err(DbError::InvalidRequest("collection name must not be empty".into()));
        }
        let mut cols = self.collections.write();
        if cols.contains_key(name) {
            return Err(DbError::CollectionAlreadyExists(name.to_string()));
        }
        let col = Arc::new(Collection::new(name));
        cols.insert(name.to_string(), col.clone());
        log::info!(target: "mangolite::query", "created collection {name}");
        Ok(col)
    }

    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// # Errors
    /// `NoSuchCollection` if the name is unknown.
    pub fn require(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.get_collection(name).ok_or_else(|| DbError::NoSuchCollection(name.to_string()))
    }

    pub fn delete_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    /// Collection names, sorted.
    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
