//! Implementation of [Stream] that performs filling on record batch streams.
use std::{
    pin::Pin,
    task::{Context, Poll},
};

use arrow::{datatypes::SchemaRef, error::ArrowError, record_batch::RecordBatch};
use futures::{Stream, StreamExt, ready};

use crate::{
    Result,
    driver::FillState,
    params::{FillParams, SortKeySpec},
};

/// An implementation of the fill operator that uses the [Stream] trait.
///
/// Each poll reads at most one batch from the input; the filling itself is
/// synchronous and shared with [`FillDriver`](crate::FillDriver).
#[derive(Debug)]
pub struct FillStream<S> {
    /// The producer of the input record batches.
    input: S,
    /// The thing that does the filling.
    state: FillState,
}

impl<S> FillStream<S>
where
    S: Stream<Item = Result<RecordBatch, ArrowError>> + Unpin,
{
    /// Creates a new FillStream over `input`, whose batches have `schema`.
    pub fn try_new(input: S, schema: &SchemaRef, sort_key: &SortKeySpec) -> Result<Self> {
        let params = FillParams::try_new(schema, sort_key)?;
        Ok(Self {
            input,
            state: FillState::new(params),
        })
    }

    /// The schema of the output.
    pub fn schema(&self) -> SchemaRef {
        self.state.schema()
    }
}

impl<S> Stream for FillStream<S>
where
    S: Stream<Item = Result<RecordBatch, ArrowError>> + Unpin,
{
    type Item = Result<RecordBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.state.is_finished() {
            return Poll::Ready(None);
        }

        let next = match ready!(self.input.poll_next_unpin(cx)) {
            Some(Ok(batch)) => Some(self.state.process_batch(&batch)),
            Some(Err(e)) => Some(Err(e.into())),
            None => self.state.finish().transpose(),
        };
        Poll::Ready(next)
    }
}
