//! Build filled output batches
use arrow::{
    array::{ArrayRef, UInt64Array, new_null_array},
    compute::kernels::take,
    record_batch::RecordBatch,
};

use crate::{Result, algo::FillingRow, column, params::FillParams, value::Value};

/// Accumulates the rows of one output batch: real rows copied from the
/// input interleaved with generated ones.
#[derive(Debug)]
pub(crate) struct OutputBuilder<'a> {
    params: &'a FillParams,
    /// Output values of each sort key column.
    key_values: Vec<Vec<Value>>,
    /// Input row for every output row, `None` for generated rows.
    take_idxs: Vec<Option<u64>>,
}

impl<'a> OutputBuilder<'a> {
    pub(crate) fn new(params: &'a FillParams, capacity: usize) -> Self {
        Self {
            params,
            key_values: (0..params.len())
                .map(|_| Vec::with_capacity(capacity))
                .collect(),
            take_idxs: Vec::with_capacity(capacity),
        }
    }

    /// Total rows so far.
    pub(crate) fn len(&self) -> usize {
        self.take_idxs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.take_idxs.is_empty()
    }

    /// Number of generated rows so far.
    pub(crate) fn filled_rows(&self) -> usize {
        self.take_idxs.iter().filter(|idx| idx.is_none()).count()
    }

    /// Appends a generated row. Non-key columns are null.
    pub(crate) fn push_filled(&mut self, row: &FillingRow) {
        self.push_keys(row);
        self.take_idxs.push(None);
    }

    /// Appends input row `input_row`, whose sort key values are `keys`.
    pub(crate) fn push_input(&mut self, input_row: usize, keys: &FillingRow) {
        self.push_keys(keys);
        self.take_idxs.push(Some(input_row as u64));
    }

    fn push_keys(&mut self, row: &FillingRow) {
        for (values, value) in self.key_values.iter_mut().zip(row.values()) {
            values.push(*value);
        }
    }

    /// Builds the output batch. Non-key columns are taken from `input`, or are
    /// all null if there is no input.
    pub(crate) fn build(self, input: Option<&RecordBatch>) -> Result<RecordBatch> {
        let schema = self.params.schema();
        let total_rows = self.len();
        let mut output_arrays: Vec<(usize, ArrayRef)> = Vec::with_capacity(schema.fields().len());

        for (column, values) in self.params.columns().iter().zip(&self.key_values) {
            let data_type = schema.field(column.position()).data_type();
            output_arrays.push((
                column.position(),
                column::values_to_array(data_type, values)?,
            ));
        }

        let take_arr = UInt64Array::from(self.take_idxs);
        for &idx in self.params.other_positions() {
            let array = match input {
                Some(batch) => take::take(batch.column(idx), &take_arr, None)?,
                None => new_null_array(schema.field(idx).data_type(), total_rows),
            };
            output_arrays.push((idx, array));
        }

        output_arrays.sort_by(|(a, _), (b, _)| a.cmp(b));
        let output_arrays: Vec<_> = output_arrays.into_iter().map(|(_, arr)| arr).collect();
        Ok(RecordBatch::try_new(schema, output_arrays)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Float64Array, Int64Array, StringArray},
        datatypes::{DataType, Field, Schema, SchemaRef},
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        params::{FillSpec, SortKey, SortKeySpec},
        test_util::batch_lines,
        value::Direction,
    };

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("loc", DataType::Utf8, false),
            Field::new("t", DataType::Int64, false),
            Field::new("temp", DataType::Float64, false),
        ]))
    }

    fn params() -> FillParams {
        let spec = SortKeySpec::new([SortKey::fill(
            "t",
            Direction::Ascending,
            FillSpec::new(),
        )]);
        FillParams::try_new(&schema(), &spec).unwrap()
    }

    fn key(t: i64) -> FillingRow {
        [Value::Int(t)].into_iter().collect()
    }

    #[test]
    fn test_build_output() {
        let in_batch = RecordBatch::try_new(
            schema(),
            vec![
                Arc::new(StringArray::from(vec!["kitchen", "garage"])),
                Arc::new(Int64Array::from(vec![1000, 1100])),
                Arc::new(Float64Array::from(vec![9.9, 18.18])),
            ],
        )
        .unwrap();
        let params = params();

        let mut builder = OutputBuilder::new(&params, 4);
        builder.push_filled(&key(975));
        builder.push_input(0, &key(1000));
        builder.push_filled(&key(1050));
        builder.push_input(1, &key(1100));
        assert_eq!(4, builder.len());
        assert_eq!(2, builder.filled_rows());

        let out_batch = builder.build(Some(&in_batch)).unwrap();
        let expected = [
            "+---------+------+-------+",
            "| loc     | t    | temp  |",
            "+---------+------+-------+",
            "|         | 975  |       |",
            "| kitchen | 1000 | 9.9   |",
            "|         | 1050 |       |",
            "| garage  | 1100 | 18.18 |",
            "+---------+------+-------+",
        ];
        assert_eq!(batch_lines(&[out_batch]), expected);
    }

    #[test]
    fn test_build_output_without_input() {
        let params = params();
        let mut builder = OutputBuilder::new(&params, 0);
        assert!(builder.is_empty());
        builder.push_filled(&key(1));
        builder.push_filled(&FillingRow::new(1));

        let out_batch = builder.build(None).unwrap();
        assert_eq!(2, out_batch.num_rows());
        assert_eq!(params.schema(), out_batch.schema());
        assert_eq!(2, out_batch.column(0).null_count());
        assert_eq!(1, out_batch.column(1).null_count());
        assert_eq!(2, out_batch.column(2).null_count());
    }
}
