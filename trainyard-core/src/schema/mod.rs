//! Schema registry — declarative column specs and exhaustive validation.

pub mod spec;
pub mod validate;

pub use spec::{ColumnConstraint, ColumnSpec, ColumnType, SchemaSpec};
pub use validate::{ValidationReport, Violation, validate};
