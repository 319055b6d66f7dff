//! Integration tests for resolve operations.

mod common;

use common::{service_result, service_result_with_txt, settle, wait_until, MockPlatform};
use lanscout_core::{
    DiscoveryConfig, DiscoveryError, Endpoint, Host, PermissionState, PlatformError,
};
use lanscout_discovery::platform::{BrowseNotification, ConnectionUpdate, ResultChange};
use lanscout_discovery::{DiscoveryEvent, DiscoveryService, DiscoveryStream, Resolver};
use std::sync::Arc;

fn facade(platform: &Arc<MockPlatform>) -> DiscoveryService {
    DiscoveryService::new(platform.clone(), DiscoveryConfig::default()).unwrap()
}

/// Starts a browse, reports one added service, and returns its resolver.
async fn discover_one(
    platform: &Arc<MockPlatform>,
    stream: &DiscoveryStream,
    result: lanscout_discovery::platform::BrowseResult,
) -> Resolver {
    wait_until(|| platform.browse_count() == 1).await;
    platform
        .browse(0)
        .send(BrowseNotification::Results(vec![ResultChange::Added(
            result,
        )]))
        .await;

    match stream.recv().await {
        Some(Ok(DiscoveryEvent::Discovered { resolver, .. })) => resolver,
        other => panic!("expected Discovered, got {other:?}"),
    }
}

async fn expect_resolved(stream: &DiscoveryStream) -> lanscout_core::DiscoveredService {
    match stream.recv().await {
        Some(Ok(DiscoveryEvent::Resolved { service })) => service,
        other => panic!("expected Resolved, got {other:?}"),
    }
}

async fn expect_error(stream: &DiscoveryStream) -> DiscoveryError {
    match stream.recv().await {
        Some(Err(e)) => e,
        other => panic!("expected an error item, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_reports_host_port_and_txt() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result_with_txt("printer1", "_ipp._tcp.local.", "local.", &[(
            "path",
            b"/api".as_slice(),
        )]),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;
    // The cached browse result seeds the connection endpoint
    assert_eq!(
        platform.connection_endpoint(0),
        Endpoint::Service {
            name: "printer1".to_string(),
            service_type: "_ipp._tcp.local.".to_string(),
            domain: "local.".to_string(),
        }
    );

    platform
        .connection(0)
        .send(ConnectionUpdate::Ready {
            remote: Some(Endpoint::HostPort {
                host: Host::V4("10.0.0.5".parse().unwrap()),
                port: 631,
            }),
        })
        .await;

    let service = expect_resolved(&stream).await;
    assert_eq!(service.addresses, vec!["10.0.0.5".to_string()]);
    assert_eq!(service.host, "10.0.0.5");
    assert_eq!(service.port, 631);
    assert_eq!(service.txt.get("path").map(Vec::as_slice), Some(b"/api".as_slice()));
    assert!(service.is_resolved());

    // The operation releases its connection after extraction
    wait_until(|| platform.connection_cancelled(0)).await;
}

#[tokio::test]
async fn test_resolve_with_host_name_leaves_addresses_empty() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;
    platform
        .connection(0)
        .send(ConnectionUpdate::Ready {
            remote: Some(Endpoint::HostPort {
                host: Host::Name("printer1.local".to_string()),
                port: 631,
            }),
        })
        .await;

    let service = expect_resolved(&stream).await;
    assert!(service.addresses.is_empty());
    assert_eq!(service.host, "printer1.local");
    assert_eq!(service.port, 631);
}

#[tokio::test]
async fn test_resolve_twice_yields_independent_results() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    resolver.resolve();
    wait_until(|| platform.connection_count() == 2).await;

    platform
        .connection(0)
        .send(ConnectionUpdate::Ready {
            remote: Some(Endpoint::HostPort {
                host: Host::V4("10.0.0.5".parse().unwrap()),
                port: 631,
            }),
        })
        .await;
    platform
        .connection(1)
        .send(ConnectionUpdate::Ready {
            remote: Some(Endpoint::HostPort {
                host: Host::V4("10.0.0.6".parse().unwrap()),
                port: 632,
            }),
        })
        .await;

    // Each invocation completes against the platform state it observed
    let first = expect_resolved(&stream).await;
    let second = expect_resolved(&stream).await;
    let mut ports = vec![first.port, second.port];
    ports.sort_unstable();
    assert_eq!(ports, vec![631, 632]);
}

#[tokio::test]
async fn test_resolve_after_removal_uses_fallback_endpoint() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result_with_txt("printer1", "_ipp._tcp.local.", "local.", &[(
            "path",
            b"/api".as_slice(),
        )]),
    )
    .await;

    platform
        .browse(0)
        .send(BrowseNotification::Results(vec![ResultChange::Removed(
            service_result("printer1", "_ipp._tcp.local.", "local."),
        )]))
        .await;
    match stream.recv().await {
        Some(Ok(DiscoveryEvent::Removed { .. })) => {}
        other => panic!("expected Removed, got {other:?}"),
    }

    // Cache entry is gone: the resolve builds an endpoint from the identity
    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;

    // A service-form remote endpoint with no port is not a resolution
    platform
        .connection(0)
        .send(ConnectionUpdate::Ready {
            remote: Some(Endpoint::Service {
                name: "printer1".to_string(),
                service_type: "_ipp._tcp.local.".to_string(),
                domain: "local.".to_string(),
            }),
        })
        .await;

    match expect_error(&stream).await {
        DiscoveryError::ResolutionIncomplete { service } => {
            assert!(service.contains("printer1"));
        }
        other => panic!("expected ResolutionIncomplete, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_without_remote_endpoint_is_incomplete() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;
    platform
        .connection(0)
        .send(ConnectionUpdate::Ready { remote: None })
        .await;

    match expect_error(&stream).await {
        DiscoveryError::ResolutionIncomplete { .. } => {}
        other => panic!("expected ResolutionIncomplete, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_failure_is_surfaced() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;
    platform
        .connection(0)
        .send(ConnectionUpdate::Failed(PlatformError::Other(
            "connection refused".to_string(),
        )))
        .await;

    match expect_error(&stream).await {
        DiscoveryError::ResolveFailed { service, reason } => {
            assert!(service.contains("printer1"));
            assert!(reason.contains("connection refused"));
        }
        other => panic!("expected ResolveFailed, got {other:?}"),
    }
    wait_until(|| platform.connection_cancelled(0)).await;
}

#[tokio::test]
async fn test_resolve_permission_failure_denies() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;
    platform
        .connection(0)
        .send(ConnectionUpdate::Failed(PlatformError::permission_denied()))
        .await;

    let error = expect_error(&stream).await;
    assert!(error.is_permission_denied());
    assert_eq!(stream.permission_state(), PermissionState::Denied);
}

#[tokio::test]
async fn test_resolve_waiting_is_reported_not_retried() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;
    platform
        .connection(0)
        .send(ConnectionUpdate::Waiting(PlatformError::Other(
            "no route".to_string(),
        )))
        .await;

    match expect_error(&stream).await {
        DiscoveryError::ResolveWaiting { reason, .. } => assert!(reason.contains("no route")),
        other => panic!("expected ResolveWaiting, got {other:?}"),
    }

    // The operation stays pending; a later ready still completes it
    assert!(!platform.connection_cancelled(0));
    platform
        .connection(0)
        .send(ConnectionUpdate::Ready {
            remote: Some(Endpoint::HostPort {
                host: Host::V4("10.0.0.5".parse().unwrap()),
                port: 631,
            }),
        })
        .await;
    let service = expect_resolved(&stream).await;
    assert_eq!(service.port, 631);
}

#[tokio::test]
async fn test_cancellation_cancels_in_flight_resolves() {
    let platform = MockPlatform::new();
    let stream = facade(&platform).discover("_ipp._tcp");
    let resolver = discover_one(
        &platform,
        &stream,
        service_result("printer1", "_ipp._tcp.local.", "local."),
    )
    .await;

    resolver.resolve();
    wait_until(|| platform.connection_count() == 1).await;

    stream.cancel();
    assert!(platform.connection_cancelled(0));
    assert!(platform.browse_cancelled(0));
    settle().await;

    // Resolving after teardown is a no-op
    resolver.resolve();
    settle().await;
    assert_eq!(platform.connection_count(), 1);
}
