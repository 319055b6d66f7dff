//! Service identity and DNS-SD name normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain browsed when the caller does not supply one.
pub const DEFAULT_DOMAIN: &str = "local.";

/// Uniquely names one advertised service instance.
///
/// Identity is structural: two browse results with the same name, type and
/// domain refer to the same service regardless of which platform handle
/// reported them. A changed or re-added service reuses the identity of the
/// entry it replaces. This triple is the only key used by the result cache
/// and the in-flight connection table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Instance name, e.g. `printer1`
    pub name: String,

    /// Fully qualified, dot-terminated service type, e.g. `_http._tcp.`
    pub service_type: String,

    /// Dot-terminated browse domain, e.g. `local.`
    pub domain: String,
}

impl ServiceIdentity {
    /// Creates an identity from platform-reported components.
    ///
    /// The type and domain get their trailing dot enforced; the domain
    /// defaults to `local.` when absent. The type is kept as reported
    /// otherwise (stripping `.local.` applies only to caller-supplied
    /// browse types, not to identities).
    pub fn new(name: impl Into<String>, service_type: &str, domain: Option<&str>) -> Self {
        Self {
            name: name.into(),
            service_type: qualified(service_type),
            domain: qualified(domain.unwrap_or(DEFAULT_DOMAIN)),
        }
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Both components already carry their trailing dot
        write!(f, "{}.{}{}", self.name, self.service_type, self.domain)
    }
}

/// Enforces the trailing dot on a DNS-SD name component.
pub fn qualified(s: &str) -> String {
    if s.ends_with('.') {
        s.to_string()
    } else {
        format!("{s}.")
    }
}

/// Strips a trailing `.local.` or `.local` suffix, if present.
pub fn strip_local(s: &str) -> &str {
    s.strip_suffix(".local.")
        .or_else(|| s.strip_suffix(".local"))
        .unwrap_or(s)
}

/// Fully qualifies a name into the `.local.` domain.
pub fn local_qualified(s: &str) -> String {
    if s.ends_with(".local.") {
        s.to_string()
    } else {
        format!("{}local.", qualified(s))
    }
}

/// Normalizes a caller-supplied browse type: any `.local.` suffix is
/// stripped before the trailing dot is re-enforced, so `_http._tcp`,
/// `_http._tcp.` and `_http._tcp.local.` all browse as `_http._tcp.`
/// against the separately supplied domain.
pub fn normalize_service_type(s: &str) -> String {
    qualified(strip_local(s))
}
