//! Data module - CSV loading, cleaning and dataset profiling

mod loader;
mod summary;

pub use loader::{DataLoader, LoaderError};
pub use summary::{ColumnProfile, DatasetSummary, NumericProfile};

use polars::prelude::DataType;

/// Column dtypes treated as numeric throughout the pipeline.
pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
