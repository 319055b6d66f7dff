//! Discovery events delivered on the stream.

use crate::resolve::Resolver;
use lanscout_core::DiscoveredService;

/// A change in the set of services visible to a browse session.
///
/// `Discovered` is the only "service is present" signal: a changed service
/// is reported as a fresh discovery of its new identity, never as an
/// update-in-place.
#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// A new or changed service appeared. The carried record is the
    /// unresolved shell; `resolver` is the capability to populate it.
    Discovered {
        service: DiscoveredService,
        resolver: Resolver,
    },

    /// Resolution of a previously discovered service completed.
    Resolved { service: DiscoveredService },

    /// A previously discovered service disappeared. Address, port and TXT
    /// fields are not meaningful here.
    Removed { service: DiscoveredService },
}

impl DiscoveryEvent {
    /// The service record the event refers to.
    pub fn service(&self) -> &DiscoveredService {
        match self {
            DiscoveryEvent::Discovered { service, .. }
            | DiscoveryEvent::Resolved { service }
            | DiscoveryEvent::Removed { service } => service,
        }
    }
}
