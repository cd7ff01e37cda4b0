//! Driver spawns and manages the inbound frame task

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::SessionConfig;
use crate::reassembly::{Routed, TransferMultiplexer};
use crate::scheduler::CoalescedScheduler;
use crate::source::FrameSource;
use crate::types::SessionStats;
use crate::LinkError;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for diagnostic counters
    pub stats: watch::Receiver<SessionStats>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns the inbound task of one device session
///
/// The task owns the frame source and the multiplexer, so every frame of
/// the session is decoded and reassembled on one logical execution
/// context. Each sealed transfer invalidates the scheduler; processing
/// itself runs elsewhere and never blocks frame intake.
pub struct Driver;

impl Driver {
    /// Spawn the inbound task for the given source
    ///
    /// Returns a stats receiver plus a cancellation token for graceful
    /// shutdown.
    pub fn spawn<S>(
        source: S,
        mux: TransferMultiplexer,
        scheduler: CoalescedScheduler,
        config: &SessionConfig,
    ) -> DriverChannels
    where
        S: FrameSource,
    {
        let (stats_tx, stats_rx) = watch::channel(SessionStats::default());
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let max_errors = config.max_source_errors.max(1);

        tokio::spawn(async move {
            Self::frame_reader_task(source, mux, scheduler, stats_tx, cancel_task, max_errors)
                .await;
        });

        DriverChannels { stats: stats_rx, cancel }
    }

    /// Frame reader task - pulls frames and feeds the multiplexer
    async fn frame_reader_task<S>(
        mut source: S,
        mut mux: TransferMultiplexer,
        scheduler: CoalescedScheduler,
        stats_tx: watch::Sender<SessionStats>,
        cancel: CancellationToken,
        max_errors: u32,
    ) where
        S: FrameSource,
    {
        info!("Frame reader task started");
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Frame reader cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Frame reader cancelled during read");
                    break;
                }
                result = source.next_frame() => result,
            };

            match result {
                Ok(Some(frame)) => {
                    error_count = 0;
                    let routed = mux.accept_frame(&frame);

                    stats_tx.send_modify(|stats| {
                        stats.frames_received += 1;
                        Self::record(stats, &routed);
                        stats.open_transfers = mux.open_transfers();
                        stats.buffered_bytes = mux.buffered_bytes();
                    });

                    match routed {
                        Ok(Routed::Sealed { .. }) => scheduler.invalidate(),
                        Ok(_) => {}
                        Err(LinkError::MalformedFrame { len }) => {
                            warn!(len, "Dropping malformed frame");
                        }
                        Err(e) => {
                            error!("Photo transfer dropped: {}", e);
                        }
                    }
                }
                Ok(None) => {
                    let frames = stats_tx.borrow().frames_received;
                    info!("Frame source ended after {} frames", frames);
                    break;
                }
                Err(e) => {
                    // Link errors are usually transient; back off and retry
                    error_count += 1;
                    stats_tx.send_modify(|stats| stats.source_errors += 1);
                    error!("Frame source error ({}/{}): {}", error_count, max_errors, e);

                    if error_count >= max_errors {
                        error!("Too many frame source errors, stopping intake");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        let open = mux.open_transfers();
        if open > 0 {
            debug!(open, "Discarding unfinished transfers");
        }
        stats_tx.send_modify(|stats| stats.ended = true);
        info!("Frame reader task ended");
    }

    fn record(stats: &mut SessionStats, routed: &crate::Result<Routed>) {
        match routed {
            Ok(Routed::Buffered { replaced, .. }) => {
                stats.chunks_buffered += 1;
                if *replaced {
                    stats.chunks_overwritten += 1;
                }
            }
            Ok(Routed::Sealed { .. }) => stats.transfers_completed += 1,
            Ok(Routed::StrayMarker { .. }) => stats.stray_markers += 1,
            Err(LinkError::MalformedFrame { .. }) => stats.malformed_frames += 1,
            Err(LinkError::Transform { .. }) => stats.transform_failures += 1,
            Err(other) => trace!("Unclassified routing error: {}", other),
        }
    }
}
