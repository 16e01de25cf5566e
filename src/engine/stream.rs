//! Per-subscriber view of committed states.

use futures_util::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Every state committed after subscription, in commit order.
///
/// Each subscriber owns an unbounded queue, so a slow reader never loses states and
/// never holds back other readers. The stream ends when the machine stops.
#[derive(Debug)]
pub struct StateStream<S> {
    receiver: mpsc::UnboundedReceiver<S>,
}

impl<S> StateStream<S> {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<S>) -> Self {
        Self { receiver }
    }

    /// Wait for the next committed state.
    pub async fn next(&mut self) -> Option<S> {
        self.receiver.recv().await
    }

    /// A state that is already queued, if any.
    pub fn try_next(&mut self) -> Option<S> {
        self.receiver.try_recv().ok()
    }
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.receiver.poll_recv(cx)
    }
}
