//! Row generation for `ORDER BY ... WITH FILL`.
//!
//! A sorted stream of [`RecordBatch`](arrow::record_batch::RecordBatch)es is
//! read through a [`FillDriver`] (or its async counterpart [`FillStream`]),
//! and rows are inserted wherever the sort key skips values of its configured
//! grid. Generated rows carry the sort key values; every other column is null.
//!
//! ```text
//! ORDER BY t WITH FILL FROM 1 TO 5 STEP 1
//!
//!  input      output
//!  +---+      +---+
//!  | t |      | t |
//!  +---+      +---+
//!  | 2 |      | 1 |  <- generated
//!  | 4 |      | 2 |
//!  +---+      | 3 |  <- generated
//!             | 4 |
//!             | 5 |  <- generated
//!             +---+
//! ```
#![warn(
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::future_not_send,
    unused_crate_dependencies
)]

mod algo;
mod builder;
mod column;
mod driver;
pub mod params;
mod stream;
#[cfg(test)]
mod test_util;
pub mod value;

use arrow::{datatypes::DataType, error::ArrowError};

pub use algo::{FillingRow, TargetKind, advance};
pub use driver::{FillDriver, FillState};
pub use params::{ColumnFill, FillParams, FillSpec, SortKey, SortKeySpec};
pub use stream::FillStream;
pub use value::{Direction, Value, equals, less};

// Used by the `test_log::test` macro.
#[cfg(test)]
use tracing_subscriber as _;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sort key must have at least one column")]
    EmptySortKey,
    #[error("sort key column {column_name} does not exist in the input schema")]
    ColumnNotFound { column_name: String },
    #[error("column {column_name} appears more than once in the sort key")]
    DuplicateColumn { column_name: String },
    #[error(
        "WITH FILL can be used only with numeric types, but is set for column {column_name} with type {data_type}"
    )]
    NonNumericColumn {
        column_name: String,
        data_type: DataType,
    },
    #[error("WITH FILL bound for column {column_name} with type {data_type} must not be negative")]
    NegativeUnsignedBound {
        column_name: String,
        data_type: DataType,
    },
    #[error("WITH FILL bound {value} does not fit column {column_name} with type {data_type}")]
    BoundOutOfRange {
        column_name: String,
        value: Value,
        data_type: DataType,
    },
    #[error("WITH FILL bounds FROM {from} TO {to} of column {column_name} are incompatible")]
    IncompatibleBounds {
        column_name: String,
        from: Value,
        to: Value,
    },
    #[error(
        "WITH FILL STEP {step} of column {column_name} must be non-zero and agree with the {direction} sort direction"
    )]
    InvalidStep {
        column_name: String,
        step: Value,
        direction: Direction,
    },
    #[error("unsupported sort key type: {data_type}")]
    UnsupportedType { data_type: DataType },
    #[error("value {value} cannot be stored in a column of type {data_type}")]
    ValueOutOfRange { value: Value, data_type: DataType },
    #[error("invalid sort key: {0}")]
    InvalidSortKey(#[from] serde_json::Error),
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for ArrowError {
    fn from(e: Error) -> Self {
        match e {
            Error::Arrow(e) => e,
            other => Self::ExternalError(Box::new(other)),
        }
    }
}
