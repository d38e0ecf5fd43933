//! Row channel - one producer / one consumer handoff for streamed rows
//!
//! The engine stores rows through [`RowSender`] while a worker runs; the
//! [`RowReceiver`] yields the frozen [`RowSet`] only once every sender is
//! dropped, which is the completion signal.

use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

use contracts::{ContractError, Row, RowEntry, RowSchema, RowSet, RowSetBuilder};

/// Create a bounded row channel collecting rows of `output_step_name`
pub fn row_channel(
    output_step_name: impl Into<String>,
    capacity: usize,
) -> (RowSender, RowReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let sender = RowSender {
        step_name: output_step_name.into(),
        tx,
    };
    (sender, RowReceiver { rx })
}

/// Producer half held by the execution engine
#[derive(Debug, Clone)]
pub struct RowSender {
    step_name: String,
    tx: mpsc::Sender<RowEntry>,
}

impl RowSender {
    /// Store a row unconditionally
    pub async fn store_row(&self, row: Row, schema: RowSchema) -> Result<(), ContractError> {
        self.tx
            .send(RowEntry { row, schema })
            .await
            .map_err(|_| ContractError::Other("row receiver dropped".to_string()))
    }

    /// Store a row emitted by `step`; rows from other steps are skipped.
    ///
    /// Returns whether the row was stored.
    pub async fn store_row_from(
        &self,
        step: &str,
        row: Row,
        schema: RowSchema,
    ) -> Result<bool, ContractError> {
        if step != self.step_name {
            trace!(step, output_step = %self.step_name, "Row from non-output step skipped");
            return Ok(false);
        }
        self.store_row(row, schema).await?;
        Ok(true)
    }

    /// Blocking variant for engine threads outside the runtime
    pub fn blocking_store_row(&self, row: Row, schema: RowSchema) -> Result<(), ContractError> {
        self.tx
            .blocking_send(RowEntry { row, schema })
            .map_err(|_| ContractError::Other("row receiver dropped".to_string()))
    }

    pub fn output_step_name(&self) -> &str {
        &self.step_name
    }
}

/// Consumer half; drains rows until the producer side completes
#[derive(Debug)]
pub struct RowReceiver {
    rx: mpsc::Receiver<RowEntry>,
}

impl RowReceiver {
    /// Wait for all senders to drop and return the frozen rows
    #[instrument(name = "row_receiver_collect", skip(self))]
    pub async fn collect(mut self) -> RowSet {
        let mut builder = RowSetBuilder::new();
        while let Some(entry) = self.rx.recv().await {
            builder.push(entry.row, entry.schema);
        }
        debug!(rows = builder.len(), "Row stream completed");
        observability::metrics::record_rows_collected(builder.len());
        builder.freeze()
    }
}
