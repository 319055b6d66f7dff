//! Multicast service discovery with permission-aware browse and resolve
//!
//! This crate turns the callback-heavy surface of a platform discovery
//! primitive (Bonjour/mDNS-style browsing, connecting, listening) into a
//! single ordered event stream plus first-class resolve capabilities:
//!
//! 1. A browse session tracks the lifecycle of advertised services
//!    (found / changed / removed), deduplicated by `(name, type, domain)`
//!    identity.
//! 2. Each `Discovered` event carries a [`Resolver`] that, on demand, opens
//!    a connection to the identity and reports back host, port, addresses
//!    and TXT metadata as a `Resolved` event on the same stream.
//! 3. Local-network permission is tracked throughout, including the
//!    throwaway-listener workaround that forces the OS permission prompt
//!    on mobile platforms.
//! 4. Transient platform conditions are distinguished from fatal ones, with
//!    a configurable timeout converting prolonged waiting into a
//!    non-terminal notice.
//!
//! The wire-level mDNS/DNS-SD exchange is not implemented here: the crate
//! consumes an implementation of [`platform::PlatformDiscovery`] and owns
//! only the discovery/resolution state machine above it.
//!
//! # Example
//!
//! ```no_run
//! use lanscout_discovery::{DiscoveryConfig, DiscoveryEvent, DiscoveryService};
//! # use std::sync::Arc;
//! # fn platform() -> Arc<dyn lanscout_discovery::platform::PlatformDiscovery> { unimplemented!() }
//!
//! # #[tokio::main]
//! # async fn main() -> lanscout_core::Result<()> {
//! let service = DiscoveryService::new(platform(), DiscoveryConfig::default())?;
//! let stream = service.discover("_http._tcp");
//!
//! while let Some(event) = stream.recv().await {
//!     match event {
//!         Ok(DiscoveryEvent::Discovered { service, resolver }) => {
//!             println!("found {}", service.identity);
//!             resolver.resolve();
//!         }
//!         Ok(DiscoveryEvent::Resolved { service }) => {
//!             println!("resolved {} -> {}", service.identity, service.connection_string());
//!         }
//!         Ok(DiscoveryEvent::Removed { service }) => {
//!             println!("lost {}", service.identity);
//!         }
//!         Err(e) => eprintln!("discovery error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod event;
pub mod permission;
pub mod platform;
pub mod resolve;
pub mod service;
pub mod stream;

mod session;

pub use event::DiscoveryEvent;
pub use permission::PermissionTrigger;
pub use resolve::Resolver;
pub use service::{DiscoverOptions, DiscoveryService};
pub use stream::{DiscoveryItem, DiscoveryStream};

// Re-export the core surface so consumers depend on one crate
pub use lanscout_core::{
    DiscoveredService, DiscoveryConfig, DiscoveryError, Endpoint, Host, PermissionState,
    PlatformError, Result, ServiceIdentity, TxtData,
};
