//! Discovery facade: the single entry point composing the permission
//! trigger, the browse session, and the event stream.

use crate::permission::PermissionTrigger;
use crate::platform::PlatformDiscovery;
use crate::session::{BrowseSession, PermissionGate, SessionShared};
use crate::stream::DiscoveryStream;
use lanscout_core::identity::{normalize_service_type, qualified};
use lanscout_core::{DiscoveryConfig, DiscoveryError, PermissionState, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Per-call options for [`DiscoveryService::discover_with`].
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Browse domain; the configured default when `None`
    pub domain: Option<String>,

    /// Force the OS permission prompt before browsing
    pub trigger_permission_prompt: bool,

    /// How long the browse may sit in the waiting state before a timeout
    /// notice; `None` disables the timer
    pub waiting_timeout: Option<Duration>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            domain: None,
            trigger_permission_prompt: false,
            waiting_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Facade over the platform discovery primitive.
///
/// `discover` starts an independent browse session per call; cancelling the
/// returned stream tears that session down. The permission state is shared
/// across sessions started from the same facade.
pub struct DiscoveryService {
    platform: Arc<dyn PlatformDiscovery>,
    config: DiscoveryConfig,
    permission: Arc<PermissionGate>,
}

impl DiscoveryService {
    /// Creates a facade over a platform primitive. Fails when the
    /// configuration is invalid.
    pub fn new(platform: Arc<dyn PlatformDiscovery>, config: DiscoveryConfig) -> Result<Self> {
        config.validate().map_err(DiscoveryError::InvalidConfig)?;
        Ok(Self {
            platform,
            config,
            permission: Arc::new(PermissionGate::default()),
        })
    }

    /// Last observed local-network permission state.
    pub fn permission_state(&self) -> PermissionState {
        self.permission.get()
    }

    /// Browses for `service_type` with the configured defaults.
    pub fn discover(&self, service_type: &str) -> DiscoveryStream {
        self.discover_with(
            service_type,
            DiscoverOptions {
                domain: None,
                trigger_permission_prompt: self.config.trigger_permission_prompt,
                waiting_timeout: self.config.waiting_timeout(),
            },
        )
    }

    /// Browses for `service_type` with explicit options.
    ///
    /// The service type is normalized (any `.local.` suffix stripped, the
    /// trailing dot enforced) before it reaches the platform. When the
    /// permission prompt is requested, the trigger runs first and the
    /// browse starts regardless of its outcome: a real denial then surfaces
    /// through the browse state machine itself.
    pub fn discover_with(&self, service_type: &str, options: DiscoverOptions) -> DiscoveryStream {
        let service_type = normalize_service_type(service_type);
        let domain = qualified(options.domain.as_deref().unwrap_or(&self.config.browse_domain));

        let (event_tx, event_rx) = async_channel::bounded(self.config.event_buffer);
        let shared = Arc::new(SessionShared::new(
            Arc::clone(&self.platform),
            event_tx,
            Arc::clone(&self.permission),
        ));

        info!(service_type = %service_type, domain = %domain, "Starting discovery");

        let session = BrowseSession::new(
            Arc::clone(&shared),
            service_type,
            domain,
            options.waiting_timeout,
        );
        let trigger = options.trigger_permission_prompt.then(|| {
            PermissionTrigger::new(Arc::clone(&self.platform), self.config.permission_timeout())
        });

        let gate = Arc::clone(&self.permission);
        let cancelled = shared.cancelled.clone();
        tokio::spawn(async move {
            if let Some(trigger) = trigger {
                tokio::select! {
                    _ = cancelled.cancelled() => return,
                    outcome = trigger.trigger() => gate.set(outcome),
                }
            }
            session.run().await;
        });

        DiscoveryStream::new(event_rx, shared)
    }
}
