//! Downstream consumer trait for completed photos

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::types::Blob;

/// Receives each batch of newly completed photos exactly once.
///
/// The scheduler calls `process` with the unconsumed suffix of the sink and
/// never runs two passes at the same time. Returning an error leaves the
/// batch unconsumed; it is offered again, together with anything newer, on
/// the next pass.
#[async_trait::async_trait]
pub trait BlobConsumer: Send + Sync + 'static {
    /// Process newly available photos, oldest first.
    ///
    /// Must accept an empty slice.
    async fn process(&self, blobs: &[Blob]) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl<C> BlobConsumer for Arc<C>
where
    C: BlobConsumer + ?Sized,
{
    async fn process(&self, blobs: &[Blob]) -> anyhow::Result<()> {
        (**self).process(blobs).await
    }
}

/// Forwards every non-empty batch into a channel, for analysis pipelines
/// running on their own task.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::Sender<Vec<Blob>>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiving end of its batches
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<Blob>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl BlobConsumer for ChannelConsumer {
    async fn process(&self, blobs: &[Blob]) -> anyhow::Result<()> {
        if blobs.is_empty() {
            return Ok(());
        }
        self.tx
            .send(blobs.to_vec())
            .await
            .map_err(|_| anyhow::anyhow!("photo batch receiver dropped"))
    }
}
