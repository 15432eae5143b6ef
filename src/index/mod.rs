//! Compound B-tree indexes and the catalog the planner consults.
pub mod btree;
pub mod catalog;
pub mod key;

pub use btree::{BTreeIndex, IndexStats};
pub use catalog::{
    Candidate, Constraints, FieldConstraint, IndexCatalog, IndexDefinition, PRIMARY_INDEX,
    TieBreak,
};
pub use key::{IndexEntry, IndexKey, KeyPart, ScanRange};
