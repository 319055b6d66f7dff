//! Per-service resolve operations.
//!
//! Resolution is on demand: each [`Resolver::resolve`] call opens its own
//! connection to the discovered identity and reports the outcome as an
//! event on the session stream. The operation seeds itself from the
//! session's result cache when possible; without a cached result it falls
//! back to an endpoint built from the identity alone, a best-effort path
//! the platform sometimes resolves with port 0.

use crate::event::DiscoveryEvent;
use crate::platform::{ConnectionControl, ConnectionUpdate};
use crate::session::SessionShared;
use lanscout_core::{
    DiscoveredService, DiscoveryError, Endpoint, PermissionState, ServiceIdentity, TxtData,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability to resolve one discovered identity, carried by `Discovered`
/// events.
///
/// Cloneable and repeatedly invokable: every call starts an independent
/// operation that completes according to the live platform state at that
/// moment, not the state when the service was discovered.
#[derive(Clone)]
pub struct Resolver {
    identity: ServiceIdentity,
    shared: Arc<SessionShared>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    pub(crate) fn new(identity: ServiceIdentity, shared: Arc<SessionShared>) -> Self {
        Self { identity, shared }
    }

    /// Identity this capability is bound to.
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// Starts a resolve operation. Completion is reported as a `Resolved`
    /// event (or an error) on the session stream, never as a return value,
    /// so it is never observed before the `Discovered` event that exposed
    /// this capability. A no-op once the session has been cancelled.
    pub fn resolve(&self) {
        if self.shared.cancelled.is_cancelled() {
            debug!(service = %self.identity, "Resolve skipped: session cancelled");
            return;
        }
        let shared = Arc::clone(&self.shared);
        let identity = self.identity.clone();
        tokio::spawn(run(shared, identity));
    }
}

async fn run(shared: Arc<SessionShared>, identity: ServiceIdentity) {
    let cached = shared.cache.get(&identity).map(|entry| entry.value().clone());
    let (endpoint, txt) = match cached {
        Some(result) => {
            let txt = extract_txt(&result.txt);
            (result.endpoint, txt)
        }
        None => {
            // Best-effort fallback: an endpoint from the identity alone,
            // known to sometimes resolve with port 0
            debug!(service = %identity, "No cached browse result; using fallback endpoint");
            (Endpoint::service(&identity), TxtData::new())
        }
    };

    let connection: Arc<dyn ConnectionControl> = match shared.platform.open_connection(&endpoint) {
        Ok(connection) => Arc::from(connection),
        Err(e) => {
            warn!(service = %identity, error = %e, "Failed to open resolve connection");
            shared
                .emit(Err(DiscoveryError::ResolveFailed {
                    service: identity.to_string(),
                    reason: e.to_string(),
                }))
                .await;
            return;
        }
    };

    let updates = connection.updates();
    // A newer resolve for the same identity replaces the tracked handle
    shared
        .connections
        .insert(identity.clone(), Arc::clone(&connection));

    loop {
        tokio::select! {
            _ = shared.cancelled.cancelled() => {
                connection.cancel();
                return;
            }

            update = updates.recv() => match update {
                Ok(ConnectionUpdate::Ready { remote }) => {
                    finish(&shared, &identity, remote, txt.clone()).await;
                    break;
                }
                Ok(ConnectionUpdate::Failed(err)) => {
                    if err.is_permission_error() {
                        shared.permission.set(PermissionState::Denied);
                        warn!(service = %identity, error = %err, "Resolve denied by permission");
                        shared.emit(Err(DiscoveryError::PermissionDenied)).await;
                    } else {
                        warn!(service = %identity, error = %err, "Resolve failed");
                        shared
                            .emit(Err(DiscoveryError::ResolveFailed {
                                service: identity.to_string(),
                                reason: err.to_string(),
                            }))
                            .await;
                    }
                    break;
                }
                Ok(ConnectionUpdate::Waiting(err)) => {
                    // Reported, not retried; the operation stays pending
                    // until ready, failed, or teardown
                    debug!(service = %identity, error = %err, "Resolve waiting");
                    shared
                        .emit(Err(DiscoveryError::ResolveWaiting {
                            service: identity.to_string(),
                            reason: err.to_string(),
                        }))
                        .await;
                }
                Ok(ConnectionUpdate::Cancelled) | Err(_) => break,
            },
        }
    }

    connection.cancel();
    shared.connections.remove(&identity);
}

/// Builds and emits the resolved record from the connection's remote
/// endpoint.
async fn finish(
    shared: &SessionShared,
    identity: &ServiceIdentity,
    remote: Option<Endpoint>,
    txt: TxtData,
) {
    let Some(remote) = remote else {
        shared
            .emit(Err(DiscoveryError::ResolutionIncomplete {
                service: identity.to_string(),
            }))
            .await;
        return;
    };

    let mut addresses = Vec::new();
    let mut port = 0u16;
    let host = match remote {
        Endpoint::HostPort { host, port: p } => {
            let literal = host.literal();
            if host.is_literal() {
                addresses.push(literal.clone());
            }
            port = p;
            literal
        }
        // The platform never produced a concrete endpoint; the service
        // name is the best host we have
        Endpoint::Service { name, .. } => name,
    };

    if port == 0 && addresses.is_empty() {
        // Connection-layer success without usable endpoint details is not
        // reported as a resolution
        warn!(service = %identity, "Resolve completed without endpoint details");
        shared
            .emit(Err(DiscoveryError::ResolutionIncomplete {
                service: identity.to_string(),
            }))
            .await;
        return;
    }

    let service = DiscoveredService {
        identity: identity.clone(),
        addresses,
        host,
        port,
        txt,
    };
    debug!(service = %identity, host = %service.host, port = service.port, "Service resolved");
    shared.emit(Ok(DiscoveryEvent::Resolved { service })).await;
}

/// Filters raw TXT metadata down to UTF-8-decodable values.
///
/// Extraction is best-effort: undecodable values are dropped and an empty
/// result is not an error.
fn extract_txt(raw: &TxtData) -> TxtData {
    raw.iter()
        .filter(|(_, value)| std::str::from_utf8(value).is_ok())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
