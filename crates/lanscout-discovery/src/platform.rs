//! Capability interface to the platform discovery primitive.
//!
//! The raw mDNS/DNS-SD packet exchange lives behind these traits. A handle
//! exposes its notifications through a cloneable channel receiver; the
//! session and resolve machinery drain those channels from their own tasks,
//! which is what serializes all state transitions for a session.

use anyhow::Result;
use async_channel::Receiver;
use lanscout_core::{Endpoint, PlatformError, ServiceIdentity, TxtData};

/// Raw browse result for one advertised instance, as last reported by the
/// platform. Cached per identity so a resolve can reuse the platform's
/// endpoint instead of reconstructing one from strings.
#[derive(Debug, Clone)]
pub struct BrowseResult {
    /// Service-form endpoint naming the instance
    pub endpoint: Endpoint,

    /// Raw TXT metadata attached to the advertisement
    pub txt: TxtData,
}

impl BrowseResult {
    /// Identity of the advertised instance, when the endpoint is
    /// service-form.
    pub fn identity(&self) -> Option<ServiceIdentity> {
        self.endpoint.identity()
    }
}

/// One entry of a browse change batch, in platform delivery order.
#[derive(Debug, Clone)]
pub enum ResultChange {
    /// A new instance appeared
    Added(BrowseResult),
    /// A previously reported instance disappeared
    Removed(BrowseResult),
    /// An instance was replaced; `old` names the superseded result
    Changed { old: BrowseResult, new: BrowseResult },
    /// Reported by some platforms for no-op refreshes
    Identical,
}

/// Browse handle state.
#[derive(Debug, Clone)]
pub enum BrowseState {
    /// The browse is running; implies the OS permitted it
    Ready,
    /// Fatal browse error
    Failed(PlatformError),
    /// Transient condition, e.g. no network path yet
    Waiting(PlatformError),
    /// The handle was cancelled
    Cancelled,
}

/// Notification from a browse handle.
#[derive(Debug, Clone)]
pub enum BrowseNotification {
    /// Handle state changed
    State(BrowseState),
    /// Batch of result changes
    Results(Vec<ResultChange>),
}

/// Connection handle state.
#[derive(Debug, Clone)]
pub enum ConnectionUpdate {
    /// Connection established. `remote` is the resolved remote endpoint,
    /// when the platform could supply one.
    Ready { remote: Option<Endpoint> },
    /// Fatal connection error
    Failed(PlatformError),
    /// Transient condition
    Waiting(PlatformError),
    /// The handle was cancelled
    Cancelled,
}

/// Listener handle state.
#[derive(Debug, Clone)]
pub enum ListenerUpdate {
    /// The listener is bound and accepting
    Ready,
    /// Fatal listener error
    Failed(PlatformError),
    /// Transient condition
    Waiting(PlatformError),
    /// The handle was cancelled
    Cancelled,
}

/// Live browse handle.
pub trait BrowseControl: Send + Sync {
    /// Channel of state and result-change notifications, in delivery order.
    fn notifications(&self) -> Receiver<BrowseNotification>;

    /// Cancels the browse. Idempotent.
    fn cancel(&self);
}

/// Live connection handle opened against an endpoint.
pub trait ConnectionControl: Send + Sync {
    /// Channel of connection state updates, in delivery order.
    fn updates(&self) -> Receiver<ConnectionUpdate>;

    /// Cancels the connection. Idempotent.
    fn cancel(&self);
}

/// Live listener handle.
pub trait ListenerControl: Send + Sync {
    /// Channel of listener state updates, in delivery order.
    fn updates(&self) -> Receiver<ListenerUpdate>;

    /// Cancels the listener. Idempotent.
    fn cancel(&self);
}

/// The platform discovery primitive consumed by this crate.
///
/// Implementations wrap whatever the OS provides for multicast service
/// browsing; this crate never touches sockets itself.
pub trait PlatformDiscovery: Send + Sync + 'static {
    /// Starts browsing for `service_type` in `domain`. Both are fully
    /// qualified, dot-terminated names.
    fn start_browse(&self, service_type: &str, domain: &str) -> Result<Box<dyn BrowseControl>>;

    /// Opens a connection to an endpoint, service-form or host/port.
    fn open_connection(&self, endpoint: &Endpoint) -> Result<Box<dyn ConnectionControl>>;

    /// Binds a listener. Port 0 asks the OS for an ephemeral port.
    fn start_listener(&self, port: u16) -> Result<Box<dyn ListenerControl>>;
}
