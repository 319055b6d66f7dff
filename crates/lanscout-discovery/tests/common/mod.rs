//! Common test utilities: an in-memory platform discovery primitive.
//!
//! The mock records every browse, connection and listener the crate starts,
//! hands each one a channel the test can feed notifications into, and
//! tracks cancellation per handle.

#![allow(dead_code)]

use async_channel::{Receiver, Sender};
use lanscout_core::{Endpoint, ServiceIdentity, TxtData};
use lanscout_discovery::platform::{
    BrowseControl, BrowseNotification, BrowseResult, ConnectionControl, ConnectionUpdate,
    ListenerControl, ListenerUpdate, PlatformDiscovery,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Test-side feed for one platform handle.
pub struct Feed<T> {
    pub tx: Sender<T>,
    cancelled: Arc<AtomicBool>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancelled: Arc::clone(&self.cancelled),
        }
    }
}

impl<T> Feed<T> {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn send(&self, item: T) {
        self.tx.send(item).await.expect("mock feed closed");
    }
}

struct MockControl<T> {
    rx: Receiver<T>,
    cancelled: Arc<AtomicBool>,
}

impl BrowseControl for MockControl<BrowseNotification> {
    fn notifications(&self) -> Receiver<BrowseNotification> {
        self.rx.clone()
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ConnectionControl for MockControl<ConnectionUpdate> {
    fn updates(&self) -> Receiver<ConnectionUpdate> {
        self.rx.clone()
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ListenerControl for MockControl<ListenerUpdate> {
    fn updates(&self) -> Receiver<ListenerUpdate> {
        self.rx.clone()
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

fn handle<T>() -> (Feed<T>, MockControl<T>) {
    let (tx, rx) = async_channel::unbounded();
    let cancelled = Arc::new(AtomicBool::new(false));
    (
        Feed {
            tx,
            cancelled: Arc::clone(&cancelled),
        },
        MockControl { rx, cancelled },
    )
}

#[derive(Default)]
struct MockState {
    browses: Vec<(String, String, Feed<BrowseNotification>)>,
    connections: Vec<(Endpoint, Feed<ConnectionUpdate>)>,
    listeners: Vec<(u16, Feed<ListenerUpdate>)>,
}

/// In-memory stand-in for the platform discovery primitive.
#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<MockState>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn browse_count(&self) -> usize {
        self.state.lock().browses.len()
    }

    /// Feed for the `index`-th browse started against the mock.
    pub fn browse(&self, index: usize) -> Feed<BrowseNotification> {
        self.state.lock().browses[index].2.clone()
    }

    /// `(service_type, domain)` the `index`-th browse was started with.
    pub fn browse_params(&self, index: usize) -> (String, String) {
        let state = self.state.lock();
        let (service_type, domain, _) = &state.browses[index];
        (service_type.clone(), domain.clone())
    }

    pub fn browse_cancelled(&self, index: usize) -> bool {
        self.state.lock().browses[index].2.is_cancelled()
    }

    pub fn connection_count(&self) -> usize {
        self.state.lock().connections.len()
    }

    pub fn connection(&self, index: usize) -> Feed<ConnectionUpdate> {
        self.state.lock().connections[index].1.clone()
    }

    pub fn connection_endpoint(&self, index: usize) -> Endpoint {
        self.state.lock().connections[index].0.clone()
    }

    pub fn connection_cancelled(&self, index: usize) -> bool {
        self.state.lock().connections[index].1.is_cancelled()
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn listener(&self, index: usize) -> Feed<ListenerUpdate> {
        self.state.lock().listeners[index].1.clone()
    }

    pub fn listener_port(&self, index: usize) -> u16 {
        self.state.lock().listeners[index].0
    }

    pub fn listener_cancelled(&self, index: usize) -> bool {
        self.state.lock().listeners[index].1.is_cancelled()
    }
}

impl PlatformDiscovery for MockPlatform {
    fn start_browse(
        &self,
        service_type: &str,
        domain: &str,
    ) -> anyhow::Result<Box<dyn BrowseControl>> {
        let (feed, control) = handle();
        self.state
            .lock()
            .browses
            .push((service_type.to_string(), domain.to_string(), feed));
        Ok(Box::new(control))
    }

    fn open_connection(&self, endpoint: &Endpoint) -> anyhow::Result<Box<dyn ConnectionControl>> {
        let (feed, control) = handle();
        self.state.lock().connections.push((endpoint.clone(), feed));
        Ok(Box::new(control))
    }

    fn start_listener(&self, port: u16) -> anyhow::Result<Box<dyn ListenerControl>> {
        let (feed, control) = handle();
        self.state.lock().listeners.push((port, feed));
        Ok(Box::new(control))
    }
}

/// Builds a service-form browse result without TXT metadata.
pub fn service_result(name: &str, service_type: &str, domain: &str) -> BrowseResult {
    BrowseResult {
        endpoint: Endpoint::Service {
            name: name.to_string(),
            service_type: service_type.to_string(),
            domain: domain.to_string(),
        },
        txt: TxtData::new(),
    }
}

/// Builds a service-form browse result with TXT metadata.
pub fn service_result_with_txt(
    name: &str,
    service_type: &str,
    domain: &str,
    txt: &[(&str, &[u8])],
) -> BrowseResult {
    let mut result = service_result(name, service_type, domain);
    for (key, value) in txt {
        result.txt.insert(key.to_string(), value.to_vec());
    }
    result
}

pub fn identity(name: &str, service_type: &str, domain: &str) -> ServiceIdentity {
    ServiceIdentity::new(name, service_type, Some(domain))
}

/// Spins the scheduler until `condition` holds, without advancing time.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Gives queued tasks a chance to run without advancing time.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
