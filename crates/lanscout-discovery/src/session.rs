//! Browse session: a single task owning all discovery state transitions.
//!
//! One session drives one platform browse. Every notification — state
//! changes, result batches, the waiting timer, teardown — is handled on the
//! session task, so cache and table mutation never race. Teardown is the
//! explicit [`SessionShared::stop`] contract, invoked by the stream on
//! cancellation and drop.

use crate::event::DiscoveryEvent;
use crate::platform::{
    BrowseControl, BrowseNotification, BrowseResult, BrowseState, ConnectionControl,
    PlatformDiscovery, ResultChange,
};
use crate::resolve::Resolver;
use crate::stream::DiscoveryItem;
use async_channel::{Receiver, Sender};
use dashmap::DashMap;
use lanscout_core::{
    DiscoveredService, DiscoveryError, PermissionState, PlatformError, ServiceIdentity,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Session-scoped permission state cell.
///
/// Owned by the facade and shared into every session it starts, so a denial
/// observed by one browse is visible to the next.
#[derive(Debug, Default)]
pub(crate) struct PermissionGate {
    state: RwLock<PermissionState>,
}

impl PermissionGate {
    pub(crate) fn get(&self) -> PermissionState {
        *self.state.read()
    }

    pub(crate) fn set(&self, next: PermissionState) {
        let mut current = self.state.write();
        if *current != next {
            debug!(state = ?next, "Permission state changed");
            *current = next;
        }
    }
}

/// State shared between the session task, resolve operations, and the
/// consumer-facing stream. The cache and the connection table are owned by
/// exactly one session; nothing outside it holds a reference.
pub(crate) struct SessionShared {
    /// Platform primitive used for browsing and resolve connections
    pub(crate) platform: Arc<dyn PlatformDiscovery>,

    /// Event channel towards the consumer
    pub(crate) events: Sender<DiscoveryItem>,

    /// Last-known raw browse result per identity; seeds resolve operations
    pub(crate) cache: DashMap<ServiceIdentity, BrowseResult>,

    /// In-flight resolve connections, cancelled wholesale on teardown
    pub(crate) connections: DashMap<ServiceIdentity, Arc<dyn ConnectionControl>>,

    /// The live platform browse handle, parked here so `stop` can reach it
    pub(crate) browse: Mutex<Option<Box<dyn BrowseControl>>>,

    /// Fires once on teardown; every callback path checks it first
    pub(crate) cancelled: CancellationToken,

    /// Session-scoped permission state
    pub(crate) permission: Arc<PermissionGate>,
}

impl SessionShared {
    pub(crate) fn new(
        platform: Arc<dyn PlatformDiscovery>,
        events: Sender<DiscoveryItem>,
        permission: Arc<PermissionGate>,
    ) -> Self {
        Self {
            platform,
            events,
            cache: DashMap::new(),
            connections: DashMap::new(),
            browse: Mutex::new(None),
            cancelled: CancellationToken::new(),
            permission,
        }
    }

    /// Delivers an item to the consumer unless teardown already started.
    pub(crate) async fn emit(&self, item: DiscoveryItem) {
        if self.cancelled.is_cancelled() {
            return;
        }
        if self.events.send(item).await.is_err() {
            debug!("Discovery event dropped: consumer gone");
        }
    }

    /// Tears the session down: cancels the browse handle, every in-flight
    /// resolve connection, and the waiting timer (which lives on the
    /// session task), then clears the cache and closes the event channel.
    /// Idempotent and callable from any context.
    pub(crate) fn stop(&self) {
        let first = !self.cancelled.is_cancelled();
        self.cancelled.cancel();

        if let Some(browse) = self.browse.lock().take() {
            browse.cancel();
        }

        for entry in self.connections.iter() {
            entry.value().cancel();
        }
        self.connections.clear();
        self.cache.clear();
        self.events.close();

        if first {
            info!("Discovery session stopped");
        }
    }
}

/// Converts raw platform browse notifications into deduplicated discovery
/// events keyed by [`ServiceIdentity`], and runs the waiting-timeout state
/// machine.
pub(crate) struct BrowseSession {
    shared: Arc<SessionShared>,
    service_type: String,
    domain: String,
    waiting_timeout: Option<Duration>,
}

impl BrowseSession {
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        service_type: String,
        domain: String,
        waiting_timeout: Option<Duration>,
    ) -> Self {
        Self {
            shared,
            service_type,
            domain,
            waiting_timeout,
        }
    }

    /// Runs until the platform stops reporting or the session is cancelled.
    pub(crate) async fn run(self) {
        let notifications = match self.start_browse().await {
            Some(rx) => rx,
            None => return,
        };
        self.drive(notifications).await;
        debug!(service_type = %self.service_type, "Browse session task finished");
    }

    /// Starts the platform browse and parks the handle where `stop` can
    /// cancel it. Returns `None` when the session was cancelled first or
    /// the platform refused to start.
    async fn start_browse(&self) -> Option<Receiver<BrowseNotification>> {
        if self.shared.cancelled.is_cancelled() {
            return None;
        }

        let control = match self
            .shared
            .platform
            .start_browse(&self.service_type, &self.domain)
        {
            Ok(control) => control,
            Err(e) => {
                warn!(service_type = %self.service_type, error = %e, "Failed to start browse");
                self.shared.emit(Err(DiscoveryError::Platform(e))).await;
                return None;
            }
        };

        let notifications = control.notifications();
        {
            let mut slot = self.shared.browse.lock();
            // stop() may have run between the start call and here
            if self.shared.cancelled.is_cancelled() {
                control.cancel();
                return None;
            }
            *slot = Some(control);
        }

        info!(service_type = %self.service_type, domain = %self.domain, "Browse started");
        Some(notifications)
    }

    async fn drive(&self, notifications: Receiver<BrowseNotification>) {
        // Armed while the browse sits in the waiting state: deadline plus
        // the platform's reason, reported once if the deadline passes.
        let mut waiting: Option<(Instant, String)> = None;

        loop {
            let deadline = waiting.as_ref().map(|(at, _)| *at);

            tokio::select! {
                _ = self.shared.cancelled.cancelled() => break,

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let (_, reason) = waiting.take().expect("deadline implies armed timer");
                    let waited_secs = self.waiting_timeout.unwrap_or_default().as_secs();
                    warn!(reason = %reason, waited_secs, "Browse waiting state timed out");
                    // Non-terminal: the platform may still recover
                    self.shared
                        .emit(Err(DiscoveryError::WaitingTimeout { waited_secs, reason }))
                        .await;
                }

                notification = notifications.recv() => match notification {
                    Ok(BrowseNotification::State(state)) => {
                        // Any state transition disarms the timer; re-entering
                        // the waiting state re-arms it below
                        waiting = None;
                        if self.on_state(state, &mut waiting).await {
                            break;
                        }
                    }
                    Ok(BrowseNotification::Results(changes)) => self.on_results(changes).await,
                    // Platform closed the notification channel
                    Err(_) => break,
                },
            }
        }
    }

    /// Handles a browse state change. Returns true when the session task
    /// should exit.
    async fn on_state(
        &self,
        state: BrowseState,
        waiting: &mut Option<(Instant, String)>,
    ) -> bool {
        match state {
            BrowseState::Ready => {
                // Readiness implies the OS already permitted the browse
                self.shared.permission.set(PermissionState::Granted);
                debug!(service_type = %self.service_type, "Browse ready");
                false
            }
            BrowseState::Failed(err) => {
                self.report_failure(err).await;
                false
            }
            BrowseState::Waiting(err) => {
                if err.is_permission_error() {
                    // A permission denial in the waiting state is final;
                    // the timer never enters into it
                    self.report_failure(err).await;
                } else if let Some(timeout) = self.waiting_timeout {
                    debug!(error = %err, timeout_secs = timeout.as_secs(), "Browse waiting");
                    *waiting = Some((Instant::now() + timeout, err.to_string()));
                } else {
                    debug!(error = %err, "Browse waiting; timeout disabled");
                }
                false
            }
            BrowseState::Cancelled => true,
        }
    }

    async fn report_failure(&self, err: PlatformError) {
        if err.is_permission_error() {
            self.shared.permission.set(PermissionState::Denied);
            warn!(service_type = %self.service_type, error = %err, "Local network permission denied");
            self.shared.emit(Err(DiscoveryError::PermissionDenied)).await;
        } else {
            warn!(service_type = %self.service_type, error = %err, "Browse failed");
            self.shared
                .emit(Err(DiscoveryError::BrowseFailed {
                    reason: err.to_string(),
                }))
                .await;
        }
    }

    /// Processes one change batch in platform delivery order.
    async fn on_results(&self, changes: Vec<ResultChange>) {
        for change in changes {
            match change {
                ResultChange::Added(result) => self.on_added(result).await,
                ResultChange::Removed(result) => self.on_removed(result).await,
                ResultChange::Changed { old, new } => {
                    // A change is a fresh discovery of the new identity; the
                    // superseded cache entry is dropped, never updated
                    if let Some(old_identity) = old.identity() {
                        self.shared.cache.remove(&old_identity);
                    }
                    self.on_added(new).await;
                }
                ResultChange::Identical => {}
            }
        }
    }

    async fn on_added(&self, result: BrowseResult) {
        let Some(identity) = result.identity() else {
            debug!("Ignoring browse result without a service endpoint");
            return;
        };

        debug!(service = %identity, "Service found");
        self.shared.cache.insert(identity.clone(), result);

        let resolver = Resolver::new(identity.clone(), Arc::clone(&self.shared));
        self.shared
            .emit(Ok(DiscoveryEvent::Discovered {
                service: DiscoveredService::unresolved(identity),
                resolver,
            }))
            .await;
    }

    async fn on_removed(&self, result: BrowseResult) {
        let Some(identity) = result.identity() else {
            return;
        };

        debug!(service = %identity, "Service removed");
        self.shared.cache.remove(&identity);
        self.shared
            .emit(Ok(DiscoveryEvent::Removed {
                service: DiscoveredService::unresolved(identity),
            }))
            .await;
    }
}
