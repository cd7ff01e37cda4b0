//! Push-based frame source
//!
//! Bluetooth stacks deliver notifications through callbacks. A
//! [`FramePusher`] is the handle such a callback pushes into; the paired
//! [`ChannelSource`] hands the frames to the session in the same order.

use tokio::sync::mpsc;
use tracing::trace;

use crate::source::FrameSource;
use crate::{LinkError, Result};

/// Cloneable handle for pushing raw frames into a session
#[derive(Debug, Clone)]
pub struct FramePusher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl FramePusher {
    /// Push a frame, waiting for buffer space.
    pub async fn push(&self, frame: impl Into<Vec<u8>>) -> Result<()> {
        self.tx.send(frame.into()).await.map_err(|_| LinkError::Closed)
    }

    /// Push a frame from synchronous code, such as a notification callback.
    ///
    /// Fails with [`LinkError::Source`] when the buffer is full and with
    /// [`LinkError::Closed`] when the session is gone.
    pub fn try_push(&self, frame: impl Into<Vec<u8>>) -> Result<()> {
        self.tx.try_send(frame.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                LinkError::source_failed("frame buffer full, notification dropped")
            }
            mpsc::error::TrySendError::Closed(_) => LinkError::Closed,
        })
    }

    /// Whether the receiving session has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Frame source fed by [`FramePusher`] handles.
///
/// Ends once every pusher has been dropped and the buffer is drained.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelSource {
    /// Create a source buffering up to `capacity` frames
    pub fn new(capacity: usize) -> (FramePusher, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (FramePusher { tx }, Self { rx })
    }
}

#[async_trait::async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let frame = self.rx.recv().await;
        if let Some(frame) = &frame {
            trace!(len = frame.len(), "Frame pulled from channel");
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_frames_in_push_order_then_ends() {
        let (pusher, mut source) = ChannelSource::new(4);
        pusher.push(vec![1]).await.unwrap();
        pusher.try_push([2u8, 2]).unwrap();
        drop(pusher);

        assert_eq!(source.next_frame().await.unwrap(), Some(vec![1]));
        assert_eq!(source.next_frame().await.unwrap(), Some(vec![2, 2]));
        assert_eq!(source.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn try_push_reports_full_buffer() {
        let (pusher, _source) = ChannelSource::new(1);
        pusher.try_push(vec![1]).unwrap();
        assert!(matches!(pusher.try_push(vec![2]), Err(LinkError::Source { .. })));
    }

    #[tokio::test]
    async fn push_after_source_dropped_is_closed() {
        let (pusher, source) = ChannelSource::new(1);
        drop(source);
        assert!(pusher.is_closed());
        assert!(matches!(pusher.push(vec![1]).await, Err(LinkError::Closed)));
    }
}
