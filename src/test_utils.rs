//! Test utilities for building frames and observing consumers
//!
//! Shared by unit tests and benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, watch};

use crate::consumer::BlobConsumer;
use crate::types::{Blob, COMPLETION_MARKER, FrameEvent, TransferId};

/// Build a chunk frame for `transfer` carrying `payload` at `sequence`.
pub fn chunk_frame(sequence: u16, transfer: TransferId, payload: &[u8]) -> Vec<u8> {
    FrameEvent::Chunk { transfer, sequence, payload: payload.to_vec() }.to_bytes()
}

/// Build the completion marker frame for `transfer`.
pub fn complete_frame(transfer: TransferId) -> Vec<u8> {
    FrameEvent::Complete { transfer }.to_bytes()
}

/// Split `blob` into in-order chunk frames of at most `chunk_size` bytes,
/// followed by the completion marker.
///
/// # Panics
///
/// Panics if `chunk_size` is zero or the blob needs more sequence numbers
/// than the wire format allows.
pub fn split_into_frames(transfer: TransferId, blob: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    assert!(chunk_size > 0, "chunk_size must be positive");

    let mut frames: Vec<Vec<u8>> = blob
        .chunks(chunk_size)
        .enumerate()
        .map(|(sequence, payload)| {
            let sequence = u16::try_from(sequence)
                .ok()
                .filter(|s| *s != COMPLETION_MARKER)
                .expect("blob too large for one transfer");
            chunk_frame(sequence, transfer, payload)
        })
        .collect();
    frames.push(complete_frame(transfer));
    frames
}

/// Consumer that records every batch it is offered.
///
/// Batches are recorded when a call starts, so a failed call still shows up.
/// A gated consumer blocks each call until [`release`](Self::release) hands
/// it a permit, which lets tests hold a pass open while they invalidate.
pub struct RecordingConsumer {
    batches: Mutex<Vec<Vec<Vec<u8>>>>,
    calls: watch::Sender<usize>,
    gate: Option<Semaphore>,
    failures: AtomicUsize,
}

impl RecordingConsumer {
    /// Consumer that returns immediately
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Consumer whose calls wait for [`release`](Self::release)
    pub fn gated() -> Self {
        Self::build(Some(Semaphore::new(0)))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        let (calls, _) = watch::channel(0);
        Self { batches: Mutex::new(Vec::new()), calls, gate, failures: AtomicUsize::new(0) }
    }

    /// Let `n` more gated calls complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Make the next `n` calls fail
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_for_calls(&self, n: usize) {
        let mut calls = self.calls.subscribe();
        let _ = calls.wait_for(|calls| *calls >= n).await;
    }

    /// Number of calls started
    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Every batch offered so far, as plain bytes
    pub fn batches(&self) -> Vec<Vec<Vec<u8>>> {
        self.batches.lock().unwrap().clone()
    }

    /// All offered photos flattened in call order; retried ones repeat
    pub fn photos(&self) -> Vec<Vec<u8>> {
        self.batches().into_iter().flatten().collect()
    }
}

impl Default for RecordingConsumer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BlobConsumer for RecordingConsumer {
    async fn process(&self, blobs: &[Blob]) -> anyhow::Result<()> {
        self.batches.lock().unwrap().push(blobs.iter().map(|b| b.to_vec()).collect());
        self.calls.send_modify(|calls| *calls += 1);

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("injected consumer failure");
        }
        Ok(())
    }
}
