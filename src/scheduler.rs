//! Coalesced invalidation scheduler
//!
//! Drives a [`BlobConsumer`] over the growing [`BlobSink`] with single-flight,
//! trailing-edge semantics:
//!
//! ```text
//! Idle --invalidate()--> Running --(pass done, nothing pending)--> Idle
//! Running --invalidate()--> RunningWithPendingInvalidation
//! RunningWithPendingInvalidation --(pass done)--> Running (follow-up pass)
//! ```
//!
//! Any number of invalidations during a pass collapse into exactly one
//! follow-up pass, and that pass reads the sink length when it starts, so
//! nothing appended during the burst is missed. The consumer only ever sees
//! the suffix after `cursor`, and `cursor` only advances when a pass
//! succeeds: a failed batch is offered again on the next pass.

use futures::{FutureExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::consumer::BlobConsumer;
use crate::sink::BlobSink;
use crate::LinkError;

/// Scheduler lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No pass in flight
    Idle,
    /// A pass is in flight
    Running,
    /// A pass is in flight and another has been requested
    RunningWithPendingInvalidation,
}

/// Result of one processing pass
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// Blobs `[from, to)` were processed and the cursor moved to `to`
    Delivered { from: usize, to: usize },

    /// Nothing new was available; the cursor stayed put
    Unchanged { cursor: usize },

    /// The consumer failed on `[from, to)`; the cursor stayed at `from`
    Failed { from: usize, to: usize, error: Arc<LinkError> },
}

/// Single-flight, trailing-edge pass coordinator.
///
/// Cheap to clone; clones share one state machine. Passes run as Tokio
/// tasks, so [`invalidate`](Self::invalidate) must be called from within a
/// Tokio runtime.
#[derive(Clone)]
pub struct CoalescedScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<SchedulerState>,
    phase: watch::Sender<Phase>,
    outcomes: watch::Sender<Option<Arc<PassOutcome>>>,
    sink: BlobSink,
    consumer: Box<dyn BlobConsumer>,
    deliver_empty: bool,
}

#[derive(Debug)]
struct SchedulerState {
    phase: Phase,
    cursor: usize,
    runs: u64,
    closed: bool,
}

impl CoalescedScheduler {
    /// Create a scheduler that skips the consumer when nothing is new
    pub fn new(sink: BlobSink, consumer: impl BlobConsumer) -> Self {
        Self::build(sink, Box::new(consumer), false)
    }

    /// Create a scheduler using the session configuration
    pub fn from_config(
        sink: BlobSink,
        consumer: impl BlobConsumer,
        config: &SessionConfig,
    ) -> Self {
        Self::build(sink, Box::new(consumer), config.deliver_empty_passes)
    }

    fn build(sink: BlobSink, consumer: Box<dyn BlobConsumer>, deliver_empty: bool) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        let (outcomes, _) = watch::channel(None);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState {
                    phase: Phase::Idle,
                    cursor: 0,
                    runs: 0,
                    closed: false,
                }),
                phase,
                outcomes,
                sink,
                consumer,
                deliver_empty,
            }),
        }
    }

    /// Signal that new data may be available.
    ///
    /// Starts a pass when idle; otherwise records that one more pass is
    /// needed once the current one finishes. Constant time, never waits.
    /// Ignored after [`close`](Self::close).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while the scheduler is idle.
    pub fn invalidate(&self) {
        let start = {
            let mut state = self.shared.lock();
            if state.closed {
                trace!("Invalidation after close ignored");
                return;
            }

            match state.phase {
                Phase::Idle => {
                    self.shared.set_phase(&mut state, Phase::Running);
                    true
                }
                Phase::Running => {
                    self.shared.set_phase(&mut state, Phase::RunningWithPendingInvalidation);
                    false
                }
                Phase::RunningWithPendingInvalidation => false,
            }
        };

        if start {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.run_until_settled().await });
        }
    }

    /// Stop scheduling passes.
    ///
    /// A pass already in flight finishes; no follow-up pass starts.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if !state.closed {
            state.closed = true;
            debug!(cursor = state.cursor, "Scheduler closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    /// Number of blobs already handed to the consumer
    pub fn cursor(&self) -> usize {
        self.shared.lock().cursor
    }

    /// Number of passes finished, successful or not
    pub fn runs_completed(&self) -> u64 {
        self.shared.lock().runs
    }

    /// Outcome of the most recent pass
    pub fn last_outcome(&self) -> Option<Arc<PassOutcome>> {
        self.shared.outcomes.borrow().clone()
    }

    /// Outcomes of passes finishing from now on.
    ///
    /// Latest-wins: a slow reader sees the most recent outcome, not every one.
    pub fn outcomes(&self) -> impl Stream<Item = Arc<PassOutcome>> + 'static {
        WatchStream::from_changes(self.shared.outcomes.subscribe())
            .filter_map(|opt| async move { opt })
    }

    /// Wait until no pass is in flight or pending.
    pub async fn wait_idle(&self) {
        let mut phase = self.shared.phase.subscribe();
        // The sender lives in `shared`, which `self` keeps alive
        let _ = phase.wait_for(|phase| *phase == Phase::Idle).await;
    }

    /// Sink this scheduler reads from
    pub fn sink(&self) -> &BlobSink {
        &self.shared.sink
    }
}

impl std::fmt::Debug for CoalescedScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("CoalescedScheduler")
            .field("phase", &state.phase)
            .field("cursor", &state.cursor)
            .field("runs", &state.runs)
            .field("closed", &state.closed)
            .finish()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, state: &mut SchedulerState, phase: Phase) {
        state.phase = phase;
        self.phase.send_replace(phase);
    }

    async fn run_until_settled(self: Arc<Self>) {
        loop {
            self.run_pass().await;
            if !self.finish_pass() {
                break;
            }
        }
    }

    /// Record a finished pass; returns whether a follow-up pass must run.
    fn finish_pass(&self) -> bool {
        let mut state = self.lock();
        state.runs += 1;

        if state.phase == Phase::RunningWithPendingInvalidation && !state.closed {
            trace!(runs = state.runs, "Coalesced invalidation pending, starting follow-up pass");
            self.set_phase(&mut state, Phase::Running);
            true
        } else {
            self.set_phase(&mut state, Phase::Idle);
            false
        }
    }

    async fn run_pass(&self) {
        let from = self.lock().cursor;
        let to = self.sink.len();

        if to == from && !self.deliver_empty {
            trace!(cursor = from, "No new photos since last pass");
            self.publish(PassOutcome::Unchanged { cursor: from });
            return;
        }

        let blobs = self.sink.slice(from, to);
        debug!(from, to, "Processing photos");

        let result = AssertUnwindSafe(self.consumer.process(&blobs)).catch_unwind().await;
        let outcome = match result {
            Ok(Ok(())) => {
                self.lock().cursor = to;
                if to == from {
                    PassOutcome::Unchanged { cursor: from }
                } else {
                    info!(from, to, "Photos processed");
                    PassOutcome::Delivered { from, to }
                }
            }
            Ok(Err(e)) => {
                warn!(from, to, "Photo processing failed, will retry: {:#}", e);
                PassOutcome::Failed { from, to, error: Arc::new(LinkError::consumer_failed(e)) }
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(from, to, "Photo consumer panicked, will retry: {}", message);
                let error = LinkError::consumer_failed(anyhow::anyhow!(
                    "consumer panicked: {}",
                    message
                ));
                PassOutcome::Failed { from, to, error: Arc::new(error) }
            }
        };

        self.publish(outcome);
    }

    fn publish(&self, outcome: PassOutcome) {
        self.outcomes.send_replace(Some(Arc::new(outcome)));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
