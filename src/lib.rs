pub mod collection;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod find;
pub mod index;
pub mod query;
pub mod types;
pub mod utils;

use crate::collection::{Collection, IndexInfo};
use crate::config::FindConfig;
use crate::document::Document;
use crate::engine::Engine;
use crate::errors::DbError;
use crate::find::FindResult;
use crate::index::IndexDefinition;
use crate::query::telemetry::{Metrics, MetricsSnapshot, QueryLog};
use crate::query::{ExplainReport, FindRequest};
use crate::utils::num::u128_to_u64_saturating;
use std::sync::Arc;

/// The main database struct: named collections, find configuration, and query counters.
pub struct Database {
    engine: Engine,
    config: FindConfig,
    metrics: Metrics,
}

impl Default for Database {
    fn default() -> Self {
        Self::with_config(FindConfig::default())
    }
}

impl Database {
    /// Creates an empty in-memory database with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: FindConfig) -> Self {
        Self { engine: Engine::new(), config, metrics: Metrics::default() }
    }

    #[must_use]
    pub const fn config(&self) -> &FindConfig {
        &self.config
    }

    /// Creates a new collection with the given name.
    ///
    /// # Errors
    /// `CollectionAlreadyExists` if the name is taken.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.engine.create_collection(name)
    }

    /// Retrieves a collection by its name.
    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.engine.get_collection(name)
    }

    /// Deletes a collection by its name.
    pub fn delete_collection(&self, name: &str) -> bool {
        self.engine.delete_collection(name)
    }

    /// Lists the names of all collections.
    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        self.engine.list_collection_names()
    }

    /// Inserts (or replaces by `_id`) a document into the specified collection.
    ///
    /// # Errors
    /// `NoSuchCollection` if the collection does not exist.
    pub fn insert_document(&self, collection: &str, document: Document) -> Result<Option<Document>, DbError> {
        Ok(self.engine.require(collection)?.insert_document(document))
    }

    // --- Index admin ---

    /// # Errors
    /// `NoSuchCollection`, `InvalidFieldPath`, or `IndexAlreadyExists`.
    pub fn create_index(
        &self,
        collection: &str,
        fields: &[&str],
        name: Option<&str>,
    ) -> Result<IndexDefinition, DbError> {
        self.engine.require(collection)?.create_index(fields, name)
    }

    /// # Errors
    /// `NoSuchCollection` or `NoSuchIndex`.
    pub fn delete_index(&self, collection: &str, name: &str) -> Result<(), DbError> {
        self.engine.require(collection)?.delete_index(name)
    }

    /// # Errors
    /// `NoSuchCollection` if the collection does not exist.
    pub fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>, DbError> {
        Ok(self.engine.require(collection)?.list_indexes())
    }

    // --- Query API (façade over the find module) ---

    fn parse_request(&self, collection: &str, body: &str) -> Result<FindRequest, DbError> {
        FindRequest::from_json(body, &self.config).inspect_err(|e| {
            if e.is_client_error() {
                self.metrics.record_client_error(collection, e);
            }
        })
    }

    /// Runs a `_find` JSON body against a collection.
    ///
    /// # Errors
    /// `NoSuchCollection`, or a client-input error (see [`DbError::is_client_error`]) for a
    /// malformed body; nothing is evaluated in that case.
    pub fn find(&self, collection: &str, body: &str) -> Result<FindResult, DbError> {
        let col = self.engine.require(collection)?;
        let request = self.parse_request(collection, body)?;
        self.find_request(&col, &request)
    }

    /// Runs an already validated request.
    ///
    /// # Errors
    /// Propagates execution errors.
    pub fn find_request(&self, col: &Collection, request: &FindRequest) -> Result<FindResult, DbError> {
        let start = std::time::Instant::now();
        let result = col.find(request, &self.config)?;
        self.metrics.record_query(
            &QueryLog {
                collection: col.name(),
                index: &result.index,
                full_scan: result.full_scan,
                duration_ms: u128_to_u64_saturating(start.elapsed().as_millis()),
                docs_examined: result.stats.total_docs_examined,
                results: result.stats.results_returned,
            },
            self.config.slow_query_ms,
        );
        Ok(result)
    }

    /// The plan a `_find` body would run.
    ///
    /// # Errors
    /// `NoSuchCollection` or a client-input error.
    pub fn explain(&self, collection: &str, body: &str) -> Result<ExplainReport, DbError> {
        let col = self.engine.require(collection)?;
        let request = self.parse_request(collection, body)?;
        Ok(col.explain(&request, &self.config))
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[must_use]
    pub fn metrics_text(&self) -> String {
        self.metrics.metrics_text()
    }
}

/// Initializes logging from `MANGOLITE_*` environment variables.
///
/// # Errors
/// Returns an error if the log directory cannot be created or log4rs rejects the config.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    utils::logger::configure_from_env()
}
