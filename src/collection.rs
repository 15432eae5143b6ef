mod core;
mod index_admin;
mod ops;

pub use self::core::{Collection, CollectionState};
pub use index_admin::IndexInfo;
