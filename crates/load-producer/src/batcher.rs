//! Alert Batcher

use alert_model::Alert;
use dataset::{Dataset, DatasetError};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Per-producer cursor over the dataset.
///
/// Serves the window `[cursor, cursor + batch_size)` for `rotation_interval`
/// consecutive calls, then shifts it by exactly one batch width.
pub struct AlertBatcher {
    dataset: Arc<Dataset>,
    cursor: usize,
    batch_size: usize,
    rotation_interval: usize,
    calls_since_rotation: usize,
}

impl AlertBatcher {
    /// Create a batcher whose first window starts at `start`
    pub fn new(dataset: Arc<Dataset>, start: usize, batch_size: usize, rotation_interval: usize) -> Self {
        Self {
            dataset,
            cursor: start,
            batch_size,
            rotation_interval,
            calls_since_rotation: 0,
        }
    }

    /// Produce the next batch of alerts
    pub fn next_batch(&mut self) -> Result<Vec<Alert>, DatasetError> {
        if self.calls_since_rotation == self.rotation_interval {
            self.cursor += self.batch_size;
            self.calls_since_rotation = 0;
            debug!("Rotated batch window to {:?}", self.window());
        }

        let window = self.window();
        let label_sets = self.dataset.get(window.start, window.end)?;
        self.calls_since_rotation += 1;

        Ok(label_sets.into_iter().map(Alert::from).collect())
    }

    /// Dataset window served by the most recent (or first) call
    pub fn window(&self) -> Range<usize> {
        self.cursor..self.cursor + self.batch_size
    }
}
