//! Feature engineering — splitting, fitting, and applying transforms.

pub mod fitted;
pub mod split;

pub use fitted::{ColumnEncoder, FeatureMatrix, FittedTransform};
pub use split::split_dataset;
