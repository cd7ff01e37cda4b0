//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use glasslink::{Blob, BlobConsumer, FrameEvent, TransferId};

pub const AB01: TransferId = TransferId::from_bytes([0xab, 0x01]);
pub const CD02: TransferId = TransferId::from_bytes([0xcd, 0x02]);

pub fn chunk(sequence: u16, transfer: TransferId, payload: &[u8]) -> Vec<u8> {
    FrameEvent::Chunk { transfer, sequence, payload: payload.to_vec() }.to_bytes()
}

pub fn complete(transfer: TransferId) -> Vec<u8> {
    FrameEvent::Complete { transfer }.to_bytes()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("glasslink=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Consumer collecting every batch it successfully processed
#[derive(Default)]
pub struct Collector {
    batches: Mutex<Vec<Vec<Vec<u8>>>>,
}

impl Collector {
    pub fn batches(&self) -> Vec<Vec<Vec<u8>>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BlobConsumer for Collector {
    async fn process(&self, blobs: &[Blob]) -> anyhow::Result<()> {
        self.batches.lock().unwrap().push(blobs.iter().map(|b| b.to_vec()).collect());
        Ok(())
    }
}

/// Run `f` with a generous timeout so a hung session fails the test instead
/// of stalling the suite.
pub async fn within<F: std::future::Future>(f: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), f).await.expect("test timed out")
}
