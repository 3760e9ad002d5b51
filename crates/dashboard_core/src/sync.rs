use std::sync::Arc;

use chrono::Utc;
use ledger::LedgerReader;
use shared::error::ReadFailure;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};

use crate::{chain_reader::ChainReader, filter::FilterCriteria, view_state::ViewState};

#[derive(Debug, Clone)]
pub enum SyncEvent {
    Refreshed(Arc<ViewState>),
    FilterApplied(Arc<ViewState>),
    ReadFailed(ReadFailure),
}

/// A refresh that committed; `failures` lists stats fields that kept their last-good value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub work_order_count: usize,
    pub failures: Vec<ReadFailure>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The work-order collection could not be read; nothing was committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("refresh failed: {}", describe_failures(.failures))]
pub struct RefreshError {
    pub failures: Vec<ReadFailure>,
}

fn describe_failures(failures: &[ReadFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct SyncController {
    reader: ChainReader,
    state: RwLock<Arc<ViewState>>,
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncController {
    pub fn new(ledger: Arc<dyn LedgerReader>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            reader: ChainReader::new(ledger),
            state: RwLock::new(Arc::new(ViewState::default())),
            refresh_gate: Mutex::new(()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Arc<ViewState> {
        Arc::clone(&*self.state.read().await)
    }

    /// Calls are serialized: an overlapping call waits for the one in flight
    /// and then performs its own full read.
    pub async fn refresh_all(&self) -> Result<RefreshReport, RefreshError> {
        let _gate = self.refresh_gate.lock().await;

        let (stats, orders) =
            futures::join!(self.reader.read_stats(), self.reader.read_work_orders());

        for failure in &stats.failures {
            let _ = self.events.send(SyncEvent::ReadFailed(failure.clone()));
        }

        let orders = match orders {
            Ok(orders) => orders,
            Err(failure) => {
                warn!("sync: refresh aborted, keeping previous snapshot: {failure}");
                let _ = self.events.send(SyncEvent::ReadFailed(failure.clone()));
                let mut failures = stats.failures;
                failures.push(failure);
                return Err(RefreshError { failures });
            }
        };

        let work_order_count = orders.len();
        let next = {
            let mut guard = self.state.write().await;
            let merged = stats.merge_over(guard.stats());
            let next = Arc::new(guard.with_refresh(merged, orders, Utc::now()));
            *guard = Arc::clone(&next);
            next
        };

        info!(
            "sync: refreshed generation={} orders={} stale_fields={}",
            next.generation(),
            work_order_count,
            stats.failures.len()
        );
        let _ = self.events.send(SyncEvent::Refreshed(next));

        Ok(RefreshReport {
            work_order_count,
            failures: stats.failures,
        })
    }

    /// Re-derives the visible rows from the cached collection. Never touches the ledger.
    pub async fn apply_filter(&self, criteria: FilterCriteria) -> Arc<ViewState> {
        let next = {
            let mut guard = self.state.write().await;
            let next = Arc::new(guard.with_filter(criteria));
            *guard = Arc::clone(&next);
            next
        };
        let _ = self.events.send(SyncEvent::FilterApplied(Arc::clone(&next)));
        next
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
