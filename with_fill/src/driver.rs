//! Drives a [`FillingRow`] over a sequence of sorted input batches.

use std::{fmt, sync::Arc};

use arrow::{
    array::ArrayRef,
    datatypes::SchemaRef,
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchReader},
};
use tracing::{debug, trace};

use crate::{
    Result,
    algo::{FillingRow, TargetKind},
    builder::OutputBuilder,
    params::{FillParams, SortKeySpec},
    value::less,
};

/// Where the operator is in its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No input row has been seen yet.
    AwaitingFirstRow,
    /// The cursor tracks the last row copied to the output.
    Streaming,
    /// The trailing rows up to the `TO` bounds have been generated.
    Finished,
}

/// The state of the fill operator for one stream, independent of how input
/// batches are obtained. Used by both [`FillDriver`] and
/// [`FillStream`](crate::FillStream).
#[derive(Debug)]
pub struct FillState {
    params: FillParams,
    phase: Phase,
    /// The last row written to the output.
    filling_row: FillingRow,
    /// The row the cursor is advancing towards.
    next_row: FillingRow,
}

impl FillState {
    /// Creates the state for a stream with the given configuration.
    pub fn new(params: FillParams) -> Self {
        let filling_row = FillingRow::new(params.len());
        let next_row = FillingRow::new(params.len());
        let key_columns: Vec<_> = params.columns().iter().map(|c| c.position()).collect();
        debug!(
            ?key_columns,
            other_columns = ?params.other_positions(),
            "created fill state"
        );
        Self {
            params,
            phase: Phase::AwaitingFirstRow,
            filling_row,
            next_row,
        }
    }

    /// The validated configuration.
    pub fn params(&self) -> &FillParams {
        &self.params
    }

    /// Schema of the output batches.
    pub fn schema(&self) -> SchemaRef {
        self.params.schema()
    }

    /// True once the end of the input has been handled.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Copies `batch` to the output, with generated rows inserted before and
    /// between its rows.
    pub fn process_batch(&mut self, batch: &RecordBatch) -> Result<RecordBatch> {
        let rows = batch.num_rows();
        let key_columns: Vec<ArrayRef> = self
            .params
            .columns()
            .iter()
            .map(|c| Arc::clone(batch.column(c.position())))
            .collect();
        let mut output = OutputBuilder::new(&self.params, rows);

        if rows > 0 && self.phase == Phase::AwaitingFirstRow {
            self.filling_row.init_from_columns(&key_columns, 0, 0)?;
            // The input may start after the FROM bound of a column. Only the
            // most significant such column matters, the ones after it start
            // over anyway.
            let lead_in = self
                .params
                .columns()
                .iter()
                .zip(self.filling_row.values())
                .position(|(column, value)| column.starts_before(value));
            if let Some(pos) = lead_in {
                self.filling_row.init_from_defaults(&self.params, pos);
                output.push_filled(&self.filling_row);
                debug!(column = pos, row = ?self.filling_row.values(), "generated lead-in row");
            }
            self.phase = Phase::Streaming;
        }

        for row in 0..rows {
            self.next_row.init_from_columns(&key_columns, row, 0)?;

            while self
                .filling_row
                .next(&self.next_row, TargetKind::Row, &self.params)
            {
                output.push_filled(&self.filling_row);
            }

            output.push_input(row, &self.next_row);
            self.filling_row.clone_from(&self.next_row);
        }

        trace!(
            input_rows = rows,
            filled_rows = output.filled_rows(),
            "filled input batch"
        );
        output.build(Some(batch))
    }

    /// Generates the rows after the last input row, up to the `TO` bounds.
    /// Returns `None` if there are none, or if this was already done.
    pub fn finish(&mut self) -> Result<Option<RecordBatch>> {
        let phase = std::mem::replace(&mut self.phase, Phase::Finished);
        let mut output = OutputBuilder::new(&self.params, 0);

        match phase {
            Phase::Finished => return Ok(None),
            Phase::Streaming => {}
            Phase::AwaitingFirstRow => {
                self.filling_row.init_from_defaults(&self.params, 0);
                if !self.seed_in_range() {
                    debug!("empty input and no rows within the fill bounds");
                    return Ok(None);
                }
                output.push_filled(&self.filling_row);
            }
        }

        self.next_row.init_from_bounds(&self.params);
        while self
            .filling_row
            .next(&self.next_row, TargetKind::Bound, &self.params)
        {
            output.push_filled(&self.filling_row);
        }

        if output.is_empty() {
            return Ok(None);
        }
        debug!(rows = output.len(), "generated rows up to fill bounds");
        output.build(None).map(Some)
    }

    /// When the input is empty, the row made of the `FROM` bounds is the first
    /// output row, as long as it has a value and no bound range is empty.
    fn seed_in_range(&self) -> bool {
        let has_value = self.filling_row.values().iter().any(|v| !v.is_null());
        let empty_range = self
            .params
            .columns()
            .iter()
            .any(|c| less(&c.to(), &c.from(), c.direction()));
        has_value && !empty_range
    }
}

/// The fill operator over a blocking [`RecordBatchReader`].
///
/// Every call pulls exactly one batch from the input and returns it with
/// the generated rows spliced in. Once the input is exhausted, one more
/// batch may be returned with the rows up to the `TO` bounds.
pub struct FillDriver<R> {
    input: R,
    state: FillState,
}

impl<R> fmt::Debug for FillDriver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillDriver")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<R: RecordBatchReader> FillDriver<R> {
    /// Validates `sort_key` against the schema of `input`.
    pub fn try_new(input: R, sort_key: &SortKeySpec) -> Result<Self> {
        let params = FillParams::try_new(&input.schema(), sort_key)?;
        Ok(Self {
            input,
            state: FillState::new(params),
        })
    }

    /// The stream state.
    pub fn state(&self) -> &FillState {
        &self.state
    }

    /// Produces the next output batch, or `None` at the end of the stream.
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.state.is_finished() {
            return Ok(None);
        }
        match self.input.next() {
            Some(batch) => self.state.process_batch(&batch?).map(Some),
            None => self.state.finish(),
        }
    }
}

impl<R: RecordBatchReader> Iterator for FillDriver<R> {
    type Item = Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().map_err(ArrowError::from).transpose()
    }
}

impl<R: RecordBatchReader> RecordBatchReader for FillDriver<R> {
    fn schema(&self) -> SchemaRef {
        self.state.schema()
    }
}
