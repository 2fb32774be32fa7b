//! Background task that polls both queries and publishes snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ChatConfig;
use crate::error::ErrorCategory;
use crate::models::{DeltaSnapshot, ListSnapshot};
use crate::traits::ChatBackend;

use super::delta_feed::DeltaFeed;
use super::feeds::SnapshotFeeds;

/// What one poll round published
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub list_changed: bool,
    pub deltas_changed: bool,
    /// Category of the first query that failed this round
    pub failure: Option<ErrorCategory>,
}

/// Longest pause between polls after repeated non-transient failures
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before the next poll after `failures` consecutive non-transient
/// failures: the interval doubled per failure, capped at [`MAX_BACKOFF`].
pub fn backoff_delay(interval: Duration, failures: u32) -> Duration {
    if failures == 0 {
        return interval;
    }
    interval
        .saturating_mul(1u32 << failures.min(16))
        .min(MAX_BACKOFF.max(interval))
}

/// Spawns the polling task.
pub struct QueryPoller;

/// Handle to a running poller
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl QueryPoller {
    /// Poll both queries every `config.poll_interval` for the thread in
    /// `thread_rx`, and right away whenever the thread changes.
    ///
    /// Transient query failures (network, 5xx) are retried on the next tick.
    /// Anything else, such as a rejected token, backs off exponentially until
    /// a poll succeeds or the thread changes. The task ends
    /// when every snapshot receiver is gone, the thread sender is dropped, or
    /// [`PollerHandle::shutdown`] is called.
    pub fn spawn(
        backend: Arc<dyn ChatBackend>,
        feeds: SnapshotFeeds,
        mut thread_rx: watch::Receiver<Option<String>>,
        config: &ChatConfig,
    ) -> PollerHandle {
        let interval = config.poll_interval;
        let page_size = config.page_size;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut delta_feed = DeltaFeed::new(None);
            let mut failures: u32 = 0;
            let mut resume_at: Option<Instant> = None;

            loop {
                let thread_changed = tokio::select! {
                    _ = ticker.tick() => false,
                    changed = thread_rx.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Thread sender dropped, stopping poller");
                            break;
                        }
                        true
                    }
                };
                if feeds.is_closed() {
                    tracing::debug!("No snapshot subscribers left, stopping poller");
                    break;
                }
                if thread_changed {
                    failures = 0;
                    resume_at = None;
                } else if resume_at.is_some_and(|at| Instant::now() < at) {
                    continue;
                }

                let thread_id = thread_rx.borrow_and_update().clone();
                if delta_feed.thread_id() != thread_id.as_deref() {
                    delta_feed.reset(thread_id.clone());
                }

                match thread_id {
                    Some(thread_id) => {
                        let outcome = poll_once(
                            backend.as_ref(),
                            &feeds,
                            &mut delta_feed,
                            &thread_id,
                            page_size,
                        )
                        .await;
                        match outcome.failure {
                            Some(category) if !category.is_retryable() => {
                                failures = failures.saturating_add(1);
                                let delay = backoff_delay(interval, failures);
                                tracing::warn!(
                                    thread_id = %thread_id,
                                    category = %category,
                                    failures,
                                    delay_ms = delay.as_millis() as u64,
                                    "Backing off after non-transient query failure"
                                );
                                resume_at = Some(Instant::now() + delay);
                            }
                            _ => {
                                failures = 0;
                                resume_at = None;
                            }
                        }
                    }
                    None => {
                        feeds.publish_list(ListSnapshot::empty(None));
                        feeds.publish_deltas(DeltaSnapshot::empty(None));
                    }
                }
            }
        });

        PollerHandle { task }
    }
}

/// Run one round: list query, then the delta query with current cursors.
///
/// The delta query is issued even when no stream is reported.
pub async fn poll_once(
    backend: &dyn ChatBackend,
    feeds: &SnapshotFeeds,
    delta_feed: &mut DeltaFeed,
    thread_id: &str,
    page_size: usize,
) -> PollOutcome {
    let mut outcome = PollOutcome::default();

    match backend.list_messages(thread_id, page_size).await {
        Ok(page) => {
            delta_feed.set_streams(page.streams.clone().unwrap_or_default());
            outcome.list_changed = feeds.publish_list(ListSnapshot {
                thread_id: Some(thread_id.to_string()),
                messages: page.messages,
                streams: page.streams,
                is_done: page.is_done,
            });
        }
        Err(e) => {
            let category = e.category();
            tracing::warn!(thread_id = %thread_id, category = %category, error = %e, "List query failed");
            outcome.failure = Some(category);
        }
    }

    match backend.list_deltas(thread_id, &delta_feed.cursors()).await {
        Ok(deltas) => {
            delta_feed.ingest(deltas);
            outcome.deltas_changed = feeds.publish_deltas(delta_feed.snapshot());
        }
        Err(e) => {
            let category = e.category();
            tracing::warn!(thread_id = %thread_id, category = %category, error = %e, "Delta query failed");
            outcome.failure.get_or_insert(category);
        }
    }

    outcome
}

impl PollerHandle {
    /// Stop polling.
    pub fn shutdown(&self) {
        tracing::debug!("Shutting down query poller");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
