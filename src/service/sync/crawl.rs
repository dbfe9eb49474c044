// =============================================================================
// zOS Sync - Room Crawl Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Widens every list window in fixed batches after each completed sync
//   cycle until all of the user's rooms have been fetched once, then detaches
//   from the connection's lifecycle notifications.
//
// =============================================================================

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, instrument, warn};
use zos_sync_core::{
    traits::SlidingSyncConnection,
    types::{LifecycleEvent, LifecycleState, ListDefinition},
};

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every list window covers its joined count
    Complete,
    /// The connection stopped emitting lifecycle notifications
    Closed,
}

/// Batch-fetches all of the user's rooms by growing list ranges.
///
/// Each list's upper bound starts at its configured window and only grows.
/// A step advances every list whose joined count is above its bound; the
/// crawl ends on the first completed cycle where no list needed to grow.
pub struct RoomCrawler {
    connection: Arc<dyn SlidingSyncConnection>,
    upper_bounds: BTreeMap<String, u64>,
    batch_size: u64,
    request_gap: Duration,
}

impl RoomCrawler {
    pub fn new(
        connection: Arc<dyn SlidingSyncConnection>,
        lists: &BTreeMap<String, ListDefinition>,
        batch_size: u64,
        request_gap: Duration,
    ) -> Self {
        let upper_bounds = lists
            .iter()
            .map(|(name, list)| (name.clone(), list.upper_bound()))
            .collect();

        Self {
            connection,
            upper_bounds,
            batch_size,
            request_gap,
        }
    }

    /// Current upper bound of a list
    pub fn upper_bound(&self, list: &str) -> Option<u64> {
        self.upper_bounds.get(list).copied()
    }

    /// Grows every list that is behind its joined count by one batch.
    /// Returns whether any range changed.
    pub fn advance(&mut self) -> bool {
        let mut advanced = false;

        for (name, upper_bound) in self.upper_bounds.iter_mut() {
            let total = self.connection.list_joined_count(name).unwrap_or(0);
            if *upper_bound < total {
                *upper_bound += self.batch_size;
                debug!(
                    "📈 List {} has {} rooms, widening range to [0, {}]",
                    name, total, upper_bound
                );
                self.connection.set_list_ranges(name, vec![(0, *upper_bound)]);
                advanced = true;
            }
        }

        advanced
    }

    /// Reacts to one lifecycle notification.
    /// Returns `false` once the crawl is complete.
    async fn on_lifecycle(&mut self, event: LifecycleEvent) -> bool {
        if event.state != LifecycleState::Complete {
            return true;
        }

        tokio::time::sleep(self.request_gap).await;

        if !event.is_successful_completion() {
            debug!(
                "Sync cycle failed ({}), skipping crawl step",
                event.error.as_deref().unwrap_or("unknown error")
            );
            return true;
        }

        self.advance()
    }

    /// Drives the crawl until every list is covered. The receiver is dropped
    /// on return, which detaches the crawl from the connection.
    #[instrument(level = "debug", skip_all)]
    pub async fn run(mut self, mut events: broadcast::Receiver<LifecycleEvent>) -> CrawlOutcome {
        info!("🔄 Starting room crawl over {} lists", self.upper_bounds.len());

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("⚠️ Room crawl missed {} lifecycle notifications", skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    debug!("Lifecycle notifications closed, stopping room crawl");
                    return CrawlOutcome::Closed;
                }
            };

            if !self.on_lifecycle(event).await {
                info!("✅ Room crawl complete: {:?}", self.upper_bounds);
                return CrawlOutcome::Complete;
            }
        }
    }
}
