//! Tabular data handling — datasets and the sources they are fetched from.

pub mod dataset;
pub mod source;

pub use dataset::Dataset;
pub use source::{CsvSource, DataSource, DataSourceConfig, InMemorySource, JsonlSource};
