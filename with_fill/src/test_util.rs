//! Helpers shared by the unit tests.
use arrow::{
    array::AsArray,
    compute::cast,
    datatypes::{DataType, Int64Type},
    record_batch::RecordBatch,
    util::pretty::pretty_format_batches,
};

/// Pretty prints `batches` as a table, one line per element.
pub(crate) fn batch_lines(batches: &[RecordBatch]) -> Vec<String> {
    pretty_format_batches(batches)
        .unwrap()
        .to_string()
        .lines()
        .map(String::from)
        .collect()
}

/// The values of column `idx` across all of `batches`, as i64.
pub(crate) fn int_column(batches: &[RecordBatch], idx: usize) -> Vec<Option<i64>> {
    batches
        .iter()
        .flat_map(|batch| {
            let array = cast(batch.column(idx), &DataType::Int64).unwrap();
            array.as_primitive::<Int64Type>().iter().collect::<Vec<_>>()
        })
        .collect()
}
