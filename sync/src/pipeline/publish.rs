use common::{Error, Result};
use tracing::info;

use crate::catalog::TripCatalog;
use crate::models::TripRecord;

/// Publishes validated records to the catalog in bounded batches. Upsert is
/// keyed on trip_id, so re-publishing a batch leaves the dataset unchanged.
pub struct BatchPublisher {
    batch_size: usize,
}

impl BatchPublisher {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Submit the records sequentially in batch-size chunks. A failing batch
    /// aborts the run; its position is carried in the error so an operator
    /// knows how much of the sequence is already committed.
    pub async fn publish(
        &self,
        catalog: &dyn TripCatalog,
        records: &[TripRecord],
    ) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let total = records.len().div_ceil(self.batch_size);
        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            catalog
                .upsert(batch)
                .await
                .map_err(|e| Error::PublishFailed {
                    index: i + 1,
                    total,
                    reason: e.to_string(),
                })?;
            info!(
                batch = i + 1,
                total,
                rows = batch.len(),
                "Published batch"
            );
        }

        Ok(records.len())
    }
}
