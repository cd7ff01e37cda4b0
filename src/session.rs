//! Photo session handle

use futures::{Stream, StreamExt, stream};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::consumer::BlobConsumer;
use crate::driver::Driver;
use crate::reassembly::TransferMultiplexer;
use crate::scheduler::CoalescedScheduler;
use crate::sink::BlobSink;
use crate::source::FrameSource;
use crate::stream::ThrottleExt;
use crate::transform::{BlobTransform, Identity};
use crate::types::{Blob, SessionStats, UpdateRate};

/// One attached device session.
///
/// Owns the inbound driver task and the scheduler for a single frame
/// source. Dropping the session stops intake; a pass already running is
/// allowed to finish.
pub struct PhotoSession {
    /// Completed photos, in completion order
    sink: BlobSink,

    /// Processing coordinator
    scheduler: CoalescedScheduler,

    /// Diagnostic counters published by the driver
    stats: watch::Receiver<SessionStats>,

    /// Default rate for stats streams
    stats_rate: UpdateRate,

    /// Cancellation token for stopping the driver
    cancel: CancellationToken,
}

impl PhotoSession {
    /// Attach a frame source, storing photos exactly as received.
    ///
    /// Must be called within a Tokio runtime.
    pub fn attach<S, C>(source: S, consumer: C, config: &SessionConfig) -> Self
    where
        S: FrameSource,
        C: BlobConsumer,
    {
        Self::attach_with_transform(source, consumer, Identity, config)
    }

    /// Attach a frame source, passing each completed photo through `transform`.
    pub fn attach_with_transform<S, C, T>(
        source: S,
        consumer: C,
        transform: T,
        config: &SessionConfig,
    ) -> Self
    where
        S: FrameSource,
        C: BlobConsumer,
        T: BlobTransform,
    {
        let sink = BlobSink::new();
        let mux = TransferMultiplexer::with_transform(sink.clone(), transform);
        let scheduler = CoalescedScheduler::from_config(sink.clone(), consumer, config);

        let channels = Driver::spawn(source, mux, scheduler.clone(), config);
        info!("Photo session attached");

        Self {
            sink,
            scheduler,
            stats: channels.stats,
            stats_rate: config.stats_rate.normalize(),
            cancel: channels.cancel,
        }
    }

    /// Every completed photo, from the first one on.
    ///
    /// Ends when the session is closed or dropped.
    pub fn photos(&self) -> impl Stream<Item = Blob> + Send + 'static {
        let sink = self.sink.clone();
        let mut seen = 0;

        WatchStream::new(self.sink.subscribe())
            .flat_map(move |len| {
                let batch = sink.slice(seen, len);
                seen = seen.max(len);
                stream::iter(batch)
            })
            .take_until(self.cancel.clone().cancelled_owned())
            .boxed()
    }

    /// Number of completed photos
    pub fn photo_count(&self) -> usize {
        self.sink.len()
    }

    /// All completed photos so far
    pub fn photos_snapshot(&self) -> Vec<Blob> {
        self.sink.snapshot()
    }

    /// Current diagnostic counters
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }

    /// Stats updates at the configured default rate
    pub fn stats_stream(&self) -> impl Stream<Item = SessionStats> + 'static {
        self.stats_updates(self.stats_rate)
    }

    /// Stats updates, throttled to `rate`.
    ///
    /// Ends once the driver has stopped and its final counters were seen.
    pub fn stats_updates(&self, rate: UpdateRate) -> impl Stream<Item = SessionStats> + 'static {
        let updates = WatchStream::new(self.stats.clone());

        match rate.normalize().throttle_interval() {
            None => updates.boxed(),
            Some(interval) => updates.throttle(interval).boxed(),
        }
    }

    /// Wait until the frame source has ended or intake was stopped
    pub async fn wait_ended(&self) {
        let mut stats = self.stats.clone();
        // Sender drop also means the driver is gone
        let _ = stats.wait_for(|stats| stats.ended).await;
    }

    /// Whether the inbound side has stopped
    pub fn is_ended(&self) -> bool {
        self.stats.borrow().ended
    }

    /// Processing coordinator for this session
    pub fn scheduler(&self) -> &CoalescedScheduler {
        &self.scheduler
    }

    /// Completed photo sink
    pub fn sink(&self) -> &BlobSink {
        &self.sink
    }

    /// Stop intake and scheduling.
    ///
    /// Unfinished transfers are discarded. A pass already in flight finishes.
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            info!("Closing photo session");
        }
        self.cancel.cancel();
        self.scheduler.close();
    }
}

impl Drop for PhotoSession {
    fn drop(&mut self) {
        debug!("Dropping photo session");
        self.cancel.cancel();
        self.scheduler.close();
    }
}

impl std::fmt::Debug for PhotoSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoSession")
            .field("photos", &self.sink.len())
            .field("scheduler", &self.scheduler)
            .field("ended", &self.is_ended())
            .finish()
    }
}
