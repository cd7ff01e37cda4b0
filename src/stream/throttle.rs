//! Stream throttling utilities

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait to add throttling to any Stream
pub trait ThrottleExt: Stream {
    /// Throttle the stream to emit at most once per interval
    ///
    /// Uses "latest-wins" semantics - if multiple items arrive
    /// during an interval, only the latest is emitted.
    fn throttle(self, duration: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, duration)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// A stream combinator that throttles emission rate
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        exhausted: bool,
    }
}

impl<S: Stream> Throttle<S> {
    /// Create a new throttled stream
    ///
    /// A zero duration is raised to one nanosecond. Must be called within a
    /// Tokio runtime.
    pub fn new(stream: S, duration: Duration) -> Self {
        let mut interval = interval(duration.max(Duration::from_nanos(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { stream, interval, pending: None, exhausted: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // Drain everything ready, keeping only the latest
        while !*this.exhausted {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.pending = Some(item),
                Poll::Ready(None) => *this.exhausted = true,
                Poll::Pending => break,
            }
        }

        if this.pending.is_none() {
            return if *this.exhausted { Poll::Ready(None) } else { Poll::Pending };
        }

        // The final item of an ended stream is flushed without waiting
        if !*this.exhausted && this.interval.poll_tick(cx).is_pending() {
            return Poll::Pending;
        }

        Poll::Ready(this.pending.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn keeps_latest_of_a_burst() {
        let items: Vec<u32> =
            futures::stream::iter(1..=5).throttle(Duration::from_millis(10)).collect().await;

        // The whole burst is ready at once, then the source ends
        assert_eq!(items, vec![5]);
    }

    #[tokio::test]
    async fn empty_stream_ends() {
        let items: Vec<u32> =
            futures::stream::empty::<u32>().throttle(Duration::from_millis(10)).collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn zero_duration_does_not_panic() {
        let items: Vec<u32> =
            futures::stream::iter([1, 2]).throttle(Duration::ZERO).collect().await;
        assert_eq!(items, vec![2]);
    }

    #[tokio::test]
    async fn spaced_items_all_pass() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut throttled = tokio_stream::wrappers::UnboundedReceiverStream::new(rx)
            .throttle(Duration::from_millis(5));

        tx.send(1).unwrap();
        assert_eq!(throttled.next().await, Some(1));
        tx.send(2).unwrap();
        assert_eq!(throttled.next().await, Some(2));
        drop(tx);
        assert_eq!(throttled.next().await, None);
    }
}
