//! Frame source trait for the link layer

use crate::Result;

/// Trait for raw frame producers
///
/// Sources abstract over where photo channel notifications come from (a
/// Bluetooth subscription, a recorded capture, a test harness) and yield
/// them in receipt order. The session never manages the underlying
/// connection; it only pulls frames.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Get the next raw frame
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - Next notification payload, possibly malformed
    /// - `Ok(None)` - Subscription ended (normal termination)
    /// - `Err(e)` - Transient link error; the session backs off and retries
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;
}
