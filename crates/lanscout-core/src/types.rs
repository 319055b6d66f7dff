//! Types for discovered services, platform endpoints, and permission state.

use crate::identity::ServiceIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Raw TXT record metadata published alongside a service advertisement:
/// keys mapped to opaque byte values.
pub type TxtData = HashMap<String, Vec<u8>>;

/// A service on the network, as carried by discovery events.
///
/// Produced fresh for every event; no shared mutable state. A `Discovered`
/// event carries the unresolved shell (empty addresses and host, port 0,
/// empty TXT); a `Resolved` event carries the populated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredService {
    /// Identity of the advertised instance
    pub identity: ServiceIdentity,

    /// Literal IP addresses the service resolved to (can be empty when the
    /// platform only supplied a host name)
    pub addresses: Vec<String>,

    /// Host name or address literal
    pub host: String,

    /// Service port; 0 until resolved
    pub port: u16,

    /// TXT metadata, filtered to UTF-8-decodable values
    pub txt: TxtData,
}

impl DiscoveredService {
    /// The unresolved shell carried by `Discovered` and `Removed` events.
    pub fn unresolved(identity: ServiceIdentity) -> Self {
        Self {
            identity,
            addresses: Vec::new(),
            host: String::new(),
            port: 0,
            txt: TxtData::new(),
        }
    }

    /// Whether this record carries usable endpoint details.
    pub fn is_resolved(&self) -> bool {
        self.port != 0 || !self.addresses.is_empty()
    }

    /// Returns the connection string (`host:port`), preferring a literal
    /// address over the host name.
    pub fn connection_string(&self) -> String {
        match self.addresses.first() {
            Some(addr) => format!("{}:{}", addr, self.port),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Host component of a host/port endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Host {
    /// DNS host name
    Name(String),
    /// Literal IPv4 address
    V4(Ipv4Addr),
    /// Literal IPv6 address
    V6(Ipv6Addr),
}

impl Host {
    /// Host name or address literal as a string.
    pub fn literal(&self) -> String {
        match self {
            Host::Name(name) => name.clone(),
            Host::V4(addr) => addr.to_string(),
            Host::V6(addr) => addr.to_string(),
        }
    }

    /// Whether this is a literal IP address rather than a name.
    pub fn is_literal(&self) -> bool {
        !matches!(self, Host::Name(_))
    }
}

/// An endpoint understood by the platform primitive.
///
/// Browse results carry service-form endpoints; a ready connection reads
/// back either a concrete host/port pair or, when the platform could not
/// supply one, still a service-form endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// Service-form endpoint, connectable by advertised name
    Service {
        name: String,
        service_type: String,
        domain: String,
    },
    /// Concrete host and port
    HostPort { host: Host, port: u16 },
}

impl Endpoint {
    /// Builds a service-form endpoint from an identity.
    ///
    /// This is the fallback used when no cached browse result exists; the
    /// platform is known to sometimes resolve it with port 0.
    pub fn service(identity: &ServiceIdentity) -> Self {
        Endpoint::Service {
            name: identity.name.clone(),
            service_type: identity.service_type.clone(),
            domain: identity.domain.clone(),
        }
    }

    /// Identity of the advertised instance, when service-form.
    pub fn identity(&self) -> Option<ServiceIdentity> {
        match self {
            Endpoint::Service {
                name,
                service_type,
                domain,
            } => Some(ServiceIdentity::new(
                name.clone(),
                service_type,
                Some(domain),
            )),
            Endpoint::HostPort { .. } => None,
        }
    }
}

/// Local-network permission as last observed in this session.
///
/// Session-scoped, never persisted: readiness of a browse implies the OS
/// already permitted it, a permission-classified failure implies denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// No permission-relevant signal observed yet
    #[default]
    Undetermined,
    /// The OS permitted a local-network operation
    Granted,
    /// The OS denied a local-network operation
    Denied,
}
