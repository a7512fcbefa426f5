//! Latest-wins throttling for the preview stream

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait adding [`throttle`](ThrottleExt::throttle) to any stream.
pub trait ThrottleExt: Stream {
    /// Emit at most one item per `period`. Items arriving in between
    /// replace each other, so the consumer always sees the newest one.
    ///
    /// Must be called inside a Tokio runtime.
    fn throttle(self, period: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, period)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// Stream returned by [`ThrottleExt::throttle`].
    pub struct Throttle<S: Stream> {
        #[pin]
        inner: S,
        ticks: Interval,
        latest: Option<S::Item>,
        exhausted: bool,
    }
}

impl<S: Stream> Throttle<S> {
    pub fn new(inner: S, period: Duration) -> Self {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { inner, ticks, latest: None, exhausted: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while !*this.exhausted {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.latest = Some(item),
                Poll::Ready(None) => *this.exhausted = true,
                Poll::Pending => break,
            }
        }

        // Flush the last item without waiting once the source has ended.
        if *this.exhausted {
            return Poll::Ready(this.latest.take());
        }

        if this.latest.is_none() {
            return Poll::Pending;
        }

        ready!(this.ticks.poll_tick(cx));
        Poll::Ready(this.latest.take())
    }
}
