//! Consumer-facing discovery event stream.

use crate::event::DiscoveryEvent;
use crate::session::SessionShared;
use async_channel::Receiver;
use futures::Stream;
use lanscout_core::{DiscoveryError, PermissionState};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Item yielded by a [`DiscoveryStream`]: events and non-terminal errors
/// share the channel, in session emission order.
pub type DiscoveryItem = Result<DiscoveryEvent, DiscoveryError>;

/// Live, cancellable stream of discovery events for one browse session.
///
/// Cancelling the stream is the session's single teardown path; dropping
/// the stream cancels as a backstop. Nothing is yielded after cancellation,
/// including items already in flight.
pub struct DiscoveryStream {
    // `async_channel::Receiver` is `!Unpin` (it carries a `PhantomPinned`).
    // Pinning it on the heap keeps `DiscoveryStream` itself `Unpin`, which the
    // `Stream` impl (`get_mut`) and consumers using `StreamExt::next` require.
    events: Pin<Box<Receiver<DiscoveryItem>>>,
    shared: Arc<SessionShared>,
}

impl DiscoveryStream {
    pub(crate) fn new(events: Receiver<DiscoveryItem>, shared: Arc<SessionShared>) -> Self {
        Self {
            events: Box::pin(events),
            shared,
        }
    }

    /// Receives the next event. Returns `None` once the session has been
    /// cancelled or the platform ended the browse.
    pub async fn recv(&self) -> Option<DiscoveryItem> {
        if self.shared.cancelled.is_cancelled() {
            return None;
        }
        match self.events.recv().await {
            Ok(item) if !self.shared.cancelled.is_cancelled() => Some(item),
            _ => None,
        }
    }

    /// Receives without waiting. `None` when no event is queued or the
    /// session has been cancelled.
    pub fn try_recv(&self) -> Option<DiscoveryItem> {
        if self.shared.cancelled.is_cancelled() {
            return None;
        }
        self.events.try_recv().ok()
    }

    /// Cancels the session. Before this returns, the platform browse handle
    /// is cancelled, every in-flight resolve connection is cancelled and
    /// untracked, pending timers are released, and the result cache is
    /// cleared. Safe to call any number of times.
    pub fn cancel(&self) {
        self.shared.stop();
    }

    /// Whether the session has been torn down.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.is_cancelled()
    }

    /// Last observed local-network permission state for this session.
    pub fn permission_state(&self) -> PermissionState {
        self.shared.permission.get()
    }
}

impl Stream for DiscoveryStream {
    type Item = DiscoveryItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.shared.cancelled.is_cancelled() {
            return Poll::Ready(None);
        }
        match this.events.as_mut().poll_next(cx) {
            // Drop items that raced with cancellation
            Poll::Ready(Some(_)) if this.shared.cancelled.is_cancelled() => Poll::Ready(None),
            other => other,
        }
    }
}

impl Drop for DiscoveryStream {
    fn drop(&mut self) {
        self.shared.stop();
    }
}
