//! Photo transfer reassembly for camera wearables.
//!
//! Glasslink receives the notification frames a camera wearable streams over
//! its photo channel, reassembles them into complete photos, and drives a
//! downstream consumer over the photos with coalesced, single-flight passes.
//!
//! # Features
//!
//! - **Interleaved transfers**: chunks of several photos may arrive mixed and
//!   out of order; each transfer is sealed independently
//! - **Coalesced processing**: any number of completions during a pass
//!   collapse into exactly one follow-up pass
//! - **Exactly-once delivery**: the consumer only sees photos it has not
//!   successfully processed; failed batches are offered again
//! - **Replay**: recorded frame captures drive the same pipeline offline
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use glasslink::{ChannelConsumer, Glasslink, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> glasslink::Result<()> {
//!     let (consumer, mut batches) = ChannelConsumer::new(8);
//!     let (pusher, _session) = Glasslink::channel(consumer, &SessionConfig::default());
//!
//!     // Called from the Bluetooth notification handler
//!     pusher.push(vec![0x00, 0x00, 0xab, 0x01, 0xff, 0xd8]).await?;
//!     pusher.push(vec![0xff, 0xff, 0xab, 0x01]).await?;
//!
//!     if let Some(batch) = batches.recv().await {
//!         println!("{} new photos", batch.len());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Reassembly pipeline
pub mod reassembly;
pub mod sink;
pub mod transform;

// Processing
pub mod consumer;
pub mod scheduler;

// Frame sources and session plumbing
pub mod capture;
pub mod config;
pub mod driver;
pub mod session;
pub mod source;
pub mod sources;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use config::SessionConfig;
pub use consumer::{BlobConsumer, ChannelConsumer};
pub use reassembly::{Routed, TransferBuffer, TransferMultiplexer};
pub use scheduler::{CoalescedScheduler, PassOutcome, Phase};
pub use session::PhotoSession;
pub use sink::BlobSink;
pub use source::FrameSource;
pub use sources::{ChannelSource, FramePusher, ReplaySource};
pub use transform::{BlobTransform, Identity};

#[cfg(feature = "imaging")]
pub use transform::{Rotate, Rotation};

/// Unified entry point for photo sessions.
///
/// Every constructor spawns tasks, so it must be called within a Tokio
/// runtime.
///
/// # Examples
///
/// ## Capture replay
/// ```rust,no_run
/// use glasslink::{ChannelConsumer, Glasslink, SessionConfig};
///
/// #[tokio::main]
/// async fn main() -> glasslink::Result<()> {
///     let (consumer, _batches) = ChannelConsumer::new(8);
///     let session = Glasslink::replay("walk.glcap", consumer, &SessionConfig::default())?;
///     session.wait_ended().await;
///     println!("{} photos", session.photo_count());
///     Ok(())
/// }
/// ```
pub struct Glasslink;

impl Glasslink {
    /// Attach any frame source.
    pub fn attach<S, C>(source: S, consumer: C, config: &SessionConfig) -> PhotoSession
    where
        S: FrameSource,
        C: BlobConsumer,
    {
        PhotoSession::attach(source, consumer, config)
    }

    /// Create a push-fed session.
    ///
    /// The returned [`FramePusher`] is what a notification handler pushes raw
    /// frames into; it buffers up to `config.channel_capacity` frames.
    pub fn channel<C>(consumer: C, config: &SessionConfig) -> (FramePusher, PhotoSession)
    where
        C: BlobConsumer,
    {
        let (pusher, source) = ChannelSource::new(config.channel_capacity);
        (pusher, PhotoSession::attach(source, consumer, config))
    }

    /// Replay a recorded frame capture.
    ///
    /// Frames are paced by `config.replay_frame_interval_ms` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid capture.
    pub fn replay<P, C>(path: P, consumer: C, config: &SessionConfig) -> Result<PhotoSession>
    where
        P: AsRef<std::path::Path>,
        C: BlobConsumer,
    {
        let source = ReplaySource::open(path)?.with_frame_interval(config.replay_frame_interval());
        Ok(PhotoSession::attach(source, consumer, config))
    }
}
