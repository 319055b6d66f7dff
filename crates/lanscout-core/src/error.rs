//! Error types for service discovery.
//!
//! Errors are delivered as items on the same stream or operation that
//! produced the success path, never as a fault that terminates the process.
//! Transient conditions (`ResolveWaiting`, `WaitingTimeout`) are
//! non-terminal notices; the session stays alive after reporting them.

use thiserror::Error;

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// `kDNSServiceErr_NoAuth`
pub const DNS_ERR_NO_AUTH: i32 = -65555;

/// `kDNSServiceErr_PolicyDenied`
pub const DNS_ERR_POLICY_DENIED: i32 = -65570;

/// Errors surfaced by browse sessions and resolve operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The OS denied local-network access for a browse, listen or resolve.
    /// Never retried automatically; the session's permission state flips to
    /// `Denied` whenever this is reported.
    #[error("local network permission denied: allow local network access for this app in system settings")]
    PermissionDenied,

    /// The browse sat in the waiting state for the full timeout without
    /// recovering. Non-terminal: the platform may still recover.
    #[error("browse still waiting after {waited_secs}s: {reason}")]
    WaitingTimeout { waited_secs: u64, reason: String },

    /// The platform reported a fatal browse error. The session is not
    /// restarted automatically; restart is a fresh `discover` call.
    #[error("browse failed: {reason}")]
    BrowseFailed { reason: String },

    /// A resolve connection reported a transient condition. Reported, not
    /// retried; the operation stays pending.
    #[error("resolution waiting for '{service}': {reason}")]
    ResolveWaiting { service: String, reason: String },

    /// A resolve connection failed.
    #[error("resolution failed for '{service}': {reason}")]
    ResolveFailed { service: String, reason: String },

    /// The resolve connection became ready but the platform supplied no
    /// usable endpoint details (no address and port 0).
    #[error("resolved '{service}' without endpoint details")]
    ResolutionIncomplete { service: String },

    /// Invalid discovery configuration.
    #[error("invalid discovery configuration: {0}")]
    InvalidConfig(String),

    /// Platform primitive error outside the taxonomy above.
    #[error("platform error: {0}")]
    Platform(#[from] anyhow::Error),
}

impl DiscoveryError {
    /// True for the permission-denial error.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DiscoveryError::PermissionDenied)
    }

    /// True for non-terminal notices the consumer may ignore.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiscoveryError::WaitingTimeout { .. } | DiscoveryError::ResolveWaiting { .. }
        )
    }
}

/// Error reported by the platform primitive for a browse, connection or
/// listener, retaining enough structure to classify permission denials.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// POSIX errno from the socket layer
    #[error("posix error {errno}: {message}")]
    Posix { errno: i32, message: String },

    /// DNS-SD layer error code
    #[error("dns error {code}")]
    Dns { code: i32 },

    /// Anything else the platform reports
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// True when the error indicates an OS-level authorization denial:
    /// posix `EPERM`, or the DNS-SD no-auth / policy-denied codes.
    pub fn is_permission_error(&self) -> bool {
        match self {
            PlatformError::Posix { errno, .. } => *errno == libc::EPERM,
            PlatformError::Dns { code } => {
                *code == DNS_ERR_NO_AUTH || *code == DNS_ERR_POLICY_DENIED
            }
            PlatformError::Other(_) => false,
        }
    }

    /// An `EPERM` error, as the platform raises it for local-network denial.
    pub fn permission_denied() -> Self {
        PlatformError::Posix {
            errno: libc::EPERM,
            message: "Operation not permitted".to_string(),
        }
    }
}
