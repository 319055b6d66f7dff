//! Local-network permission trigger.
//!
//! Some platforms only show their local-network permission dialog once an
//! app actually touches the network. The trigger binds a throwaway UDP
//! listener purely to provoke that dialog; the listener's network function
//! is irrelevant and it is torn down as soon as a verdict is reached.

use crate::platform::{ListenerControl, ListenerUpdate, PlatformDiscovery};
use async_channel::Receiver;
use lanscout_core::PermissionState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Keeps the throwaway listener cancelled even when the trigger future is
/// dropped mid-flight by session teardown.
struct ListenerGuard {
    inner: Box<dyn ListenerControl>,
}

impl ListenerGuard {
    fn updates(&self) -> Receiver<ListenerUpdate> {
        self.inner.updates()
    }

    fn cancel(&self) {
        self.inner.cancel();
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

/// One-shot permission prompt trigger.
pub struct PermissionTrigger {
    platform: Arc<dyn PlatformDiscovery>,
    timeout: Duration,
}

impl PermissionTrigger {
    pub fn new(platform: Arc<dyn PlatformDiscovery>, timeout: Duration) -> Self {
        Self { platform, timeout }
    }

    /// Runs the trigger to completion and reports the outcome.
    ///
    /// The first terminal signal wins: listener readiness means the OS let
    /// the bind through (`Granted`); a failure of any kind, a
    /// permission-classified waiting state, or the timeout all report
    /// `Denied`. The listener never outlives this call.
    pub async fn trigger(&self) -> PermissionState {
        // Port 0: an OS-assigned ephemeral port avoids conflicts
        let listener = match self.platform.start_listener(0) {
            Ok(listener) => ListenerGuard { inner: listener },
            Err(e) => {
                warn!(error = %e, "Permission trigger listener failed to start");
                return PermissionState::Denied;
            }
        };

        let updates = listener.updates();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                _ = &mut deadline => {
                    // No verdict within the timeout: assume not granted
                    debug!(timeout_secs = self.timeout.as_secs(), "Permission trigger timed out");
                    break PermissionState::Denied;
                }

                update = updates.recv() => match update {
                    Ok(ListenerUpdate::Ready) => break PermissionState::Granted,
                    Ok(ListenerUpdate::Failed(err)) => {
                        debug!(error = %err, "Permission trigger listener failed");
                        break PermissionState::Denied;
                    }
                    Ok(ListenerUpdate::Waiting(err)) if err.is_permission_error() => {
                        debug!(error = %err, "Permission trigger waiting on denied permission");
                        break PermissionState::Denied;
                    }
                    // Non-permission waiting: keep waiting for a verdict
                    Ok(ListenerUpdate::Waiting(_)) => {}
                    Ok(ListenerUpdate::Cancelled) | Err(_) => break PermissionState::Denied,
                },
            }
        };

        listener.cancel();
        info!(outcome = ?outcome, "Permission trigger completed");
        outcome
    }
}
