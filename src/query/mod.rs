// Telemetry is a submodule of query
pub mod telemetry;

// Submodules for separation of concerns
pub mod eval;
pub mod exec;
pub mod options;
pub mod parse;
pub mod path;
pub mod plan;
pub mod types;
pub mod value;

pub use eval::{compare_docs, matches, project_fields};
pub use exec::{DocumentSource, Execution, ExecutionStats, execute};
pub use options::parse_options;
pub use path::{FieldPath, resolve, resolve_value};
pub use plan::{ExplainReport, ScanPlan, plan};
pub use types::{
    CmpOp, Combinator, Condition, Direction, FindOptions, FindRequest, Node, Selector, SortSpec,
};
pub use value::{compare_values, json_type_name, values_equal};
