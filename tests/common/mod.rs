//! In-memory stand-ins for the remote directory and inventory.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use orgcrawl::client::{RemoteDirectory, RemoteInventory};
use orgcrawl::engine::{Crawler, EngineOptions, FailurePolicy};
use orgcrawl::models::{Application, Environment, Organization};
use orgcrawl::{Error, Result};

/// Latency injected into fake remote calls.
#[derive(Debug, Clone, Default)]
pub struct Latency {
    min_ms: u64,
    max_ms: u64,
    overrides: HashMap<String, u64>,
}

impl Latency {
    fn pick(&self, id: &str) -> Duration {
        if let Some(ms) = self.overrides.get(id) {
            return Duration::from_millis(*ms);
        }
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }
}

/// Tracks how many calls are running at once.
#[derive(Debug, Default)]
pub struct Gauge {
    calls: AtomicUsize,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) -> GaugeGuard<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct GaugeGuard<'a>(&'a Gauge);

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

fn refused(id: &str) -> Error {
    Error::transport(
        id,
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    )
}

#[derive(Debug, Default)]
pub struct FakeDirectory {
    organizations: HashMap<String, Organization>,
    failing: HashSet<String>,
    latency: Latency,
    pub gauge: Gauge,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, organization: Organization) -> Self {
        self.organizations.insert(organization.id.clone(), organization);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency.min_ms = min_ms;
        self.latency.max_ms = max_ms;
        self
    }

    pub fn slow(mut self, id: &str, ms: u64) -> Self {
        self.latency.overrides.insert(id.to_string(), ms);
        self
    }

    pub fn organization(&self, id: &str) -> &Organization {
        &self.organizations[id]
    }

    pub fn len(&self) -> usize {
        self.organizations.len()
    }
}

#[async_trait]
impl RemoteDirectory for FakeDirectory {
    async fn resolve(&self, id: &str) -> Result<Organization> {
        let _inside = self.gauge.enter();
        let delay = self.latency.pick(id);
        tokio::time::sleep(delay).await;

        if self.failing.contains(id) {
            return Err(refused(id));
        }
        self.organizations
            .get(id)
            .cloned()
            .ok_or_else(|| Error::RemoteStatus {
                target: id.to_string(),
                status: 404,
                body: "not found".to_string(),
            })
    }
}

#[derive(Debug, Default)]
pub struct FakeInventory {
    applications: HashMap<String, Vec<Application>>,
    failing: HashSet<String>,
    latency: Latency,
    pub gauge: Gauge,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, environment_id: &str, applications: Vec<Application>) -> Self {
        self.applications
            .insert(environment_id.to_string(), applications);
        self
    }

    pub fn failing(mut self, environment_id: &str) -> Self {
        self.failing.insert(environment_id.to_string());
        self
    }

    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency.min_ms = min_ms;
        self.latency.max_ms = max_ms;
        self
    }

    pub fn slow(mut self, environment_id: &str, ms: u64) -> Self {
        self.latency
            .overrides
            .insert(environment_id.to_string(), ms);
        self
    }
}

#[async_trait]
impl RemoteInventory for FakeInventory {
    async fn list(&self, environment_id: &str) -> Result<Vec<Application>> {
        let _inside = self.gauge.enter();
        let delay = self.latency.pick(environment_id);
        tokio::time::sleep(delay).await;

        if self.failing.contains(environment_id) {
            return Err(refused(environment_id));
        }
        Ok(self
            .applications
            .get(environment_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn app(domain: &str) -> Application {
    Application {
        domain: domain.to_string(),
        full_domain: format!("{}.cloudhub.io", domain),
        status: "STARTED".to_string(),
        ..Default::default()
    }
}

/// A hierarchy of the given depth where every organization has `branching`
/// children and one environment named after it.
pub fn synthetic_directory(depth: u32, branching: usize) -> FakeDirectory {
    fn add(directory: FakeDirectory, id: String, depth: u32, branching: usize) -> FakeDirectory {
        let children: Vec<String> = if depth == 0 {
            Vec::new()
        } else {
            (0..branching).map(|i| format!("{}.{}", id, i)).collect()
        };
        let organization = Organization::new(id.clone(), format!("Org {}", id))
            .with_children(children.clone())
            .with_environment(Environment::new(format!("env:{}", id), "Production"));

        let mut directory = directory.with(organization);
        for child in children {
            directory = add(directory, child, depth - 1, branching);
        }
        directory
    }

    add(FakeDirectory::new(), "org".to_string(), depth, branching)
}

/// org-1 with children org-2 and org-3; org-2 owns env-1 holding `x.example`.
pub fn scenario() -> (FakeDirectory, FakeInventory) {
    let directory = FakeDirectory::new()
        .with(Organization::new("org-1", "Acme").with_children(["org-2", "org-3"]))
        .with(
            Organization::new("org-2", "Payments")
                .with_environment(Environment::new("env-1", "Production")),
        )
        .with(Organization::new("org-3", "Retail"));
    let inventory = FakeInventory::new().with("env-1", vec![app("x.example")]);
    (directory, inventory)
}

pub fn crawler(
    directory: &Arc<FakeDirectory>,
    inventory: &Arc<FakeInventory>,
    policy: FailurePolicy,
) -> Crawler {
    crawler_with_limit(directory, inventory, policy, 64)
}

pub fn crawler_with_limit(
    directory: &Arc<FakeDirectory>,
    inventory: &Arc<FakeInventory>,
    policy: FailurePolicy,
    max_in_flight: usize,
) -> Crawler {
    Crawler::new(
        directory.clone(),
        inventory.clone(),
        EngineOptions {
            policy,
            max_in_flight,
        },
    )
}
