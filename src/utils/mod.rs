//! Utility modules: logger, developer log sink, JSON/BSON conversion, numeric helpers.
pub mod devlog;
pub mod json;
pub mod logger;
pub mod num;
