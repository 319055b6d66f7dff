//! # lanscout Core
//!
//! Core types, error handling, and configuration for the lanscout service
//! discovery stack.
//!
//! This crate provides the foundational building blocks shared by the
//! discovery state machine:
//!
//! - **Identity**: the `(name, type, domain)` triple naming one advertised
//!   service instance, plus the DNS-SD name normalization rules.
//! - **Types**: `DiscoveredService` records, platform endpoints, TXT
//!   metadata, and the session-scoped permission state.
//! - **Errors**: the discovery error taxonomy using `thiserror`, and the
//!   platform error classification (permission denial vs. everything else).
//! - **Configuration**: serde-backed defaults for browse domain, timers,
//!   and channel sizing, with validation.
//!
//! ## Example
//!
//! ```
//! use lanscout_core::identity::normalize_service_type;
//! use lanscout_core::ServiceIdentity;
//!
//! // Caller-supplied types are fully qualified before browsing
//! assert_eq!(normalize_service_type("_http._tcp.local."), "_http._tcp.");
//!
//! let identity = ServiceIdentity::new("printer1", "_http._tcp", None);
//! assert_eq!(identity.to_string(), "printer1._http._tcp.local.");
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod types;

// Re-export commonly used types for convenience
pub use config::DiscoveryConfig;
pub use error::{DiscoveryError, PlatformError, Result};
pub use identity::ServiceIdentity;
pub use types::{DiscoveredService, Endpoint, Host, PermissionState, TxtData};
