use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::engine::assignment::AssignmentEngine;
use crate::models::event::DispatchEvent;
use crate::observability::metrics::Metrics;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub engine: AssignmentEngine,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, event_buffer_size: usize, min_score: f64) -> Self {
        let metrics = Metrics::new();
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            engine: AssignmentEngine::new(store.clone(), metrics.clone(), min_score),
            store,
            events_tx,
            metrics,
        }
    }

    pub fn publish(&self, event: DispatchEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("dispatch event dropped: no subscribers");
        }
    }
}
