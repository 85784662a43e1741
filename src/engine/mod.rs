//! Concurrent crawl engine.
//!
//! Three passes run over the organization hierarchy:
//!
//! 1. [`Crawler::build_tree`] expands the hierarchy from a root id. Every child
//!    is resolved in its own task, and each task hands its finished subtree back
//!    to its parent, so no child list is ever shared between tasks.
//! 2. [`Crawler::enrich`] walks the finished tree and fills in the applications
//!    of every environment. Each environment is written by exactly one task.
//! 3. [`flatten`] projects the tree into a [`FlatIndex`] on the caller's thread.
//!
//! [`Crawler::find_by_domain`] uses the same fan-out as enrichment, but
//! detaches its tasks and tracks them with a [`WorkTracker`].
//!
//! All remote calls go through one semaphore, so at most
//! [`EngineOptions::max_in_flight`] calls are outstanding at any time.

mod enrich;
mod flatten;
mod search;
mod tracker;
mod tree;

pub use flatten::{flatten, FlatIndex, FlatKey};
pub use search::DomainMatch;
pub use tracker::{WorkGuard, WorkTracker};

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::client::{AnypointClient, RemoteDirectory, RemoteInventory};
use crate::error::{Error, Result};
use crate::models::{Application, Node, Organization};

/// Default bound on concurrent remote calls.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// What happens when one branch of the hierarchy cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// The first failure aborts the whole crawl.
    #[default]
    FailFast,
    /// The failed branch is recorded and skipped; the rest of the crawl continues.
    Bulkhead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub policy: FailurePolicy,
    pub max_in_flight: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

struct Shared {
    directory: Arc<dyn RemoteDirectory>,
    inventory: Arc<dyn RemoteInventory>,
    limiter: Semaphore,
    options: EngineOptions,
    shutdown: CancellationToken,
}

/// Entry point for crawling a hierarchy.
#[derive(Clone)]
pub struct Crawler {
    shared: Arc<Shared>,
}

impl Crawler {
    pub fn new(
        directory: Arc<dyn RemoteDirectory>,
        inventory: Arc<dyn RemoteInventory>,
        options: EngineOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                directory,
                inventory,
                limiter: Semaphore::new(options.max_in_flight.max(1)),
                options,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Crawl using one HTTP client for both the directory and the inventory.
    pub fn with_client(client: AnypointClient, options: EngineOptions) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client, options)
    }

    pub fn options(&self) -> EngineOptions {
        self.shared.options
    }

    /// Token that aborts every running and future pass when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Discover the hierarchy below `root_id`.
    ///
    /// Returns only after every spawned expansion task has finished. Fails if
    /// the root itself cannot be resolved, and on any failure under
    /// [`FailurePolicy::FailFast`]. A child the directory answers with an
    /// error status is recorded as a failed branch under either policy.
    pub async fn build_tree(&self, root_id: &str) -> Result<Node> {
        tree::build(self.run(), root_id).await
    }

    /// Fetch the applications of every environment in the tree.
    pub async fn enrich(&self, root: Node) -> Result<Node> {
        enrich::enrich(self.run(), root).await
    }

    /// Report every application whose domain equals `domain`.
    ///
    /// Environments that were already enriched are scanned locally; the rest
    /// are fetched from the inventory.
    pub async fn find_by_domain(&self, root: &Node, domain: &str) -> Result<Vec<DomainMatch>> {
        search::find_by_domain(self.run(), root, domain).await
    }

    fn run(&self) -> Run {
        Run {
            shared: Arc::clone(&self.shared),
            cancel: self.shared.shutdown.child_token(),
        }
    }
}

/// State shared by the tasks of a single pass.
#[derive(Clone)]
struct Run {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl Run {
    fn policy(&self) -> FailurePolicy {
        self.shared.options.policy
    }

    /// Stop every task of this pass.
    fn abort(&self) {
        self.cancel.cancel();
    }

    async fn resolve(&self, id: &str) -> Result<Organization> {
        self.remote(self.shared.directory.resolve(id)).await
    }

    async fn list(&self, environment_id: &str) -> Result<Vec<Application>> {
        self.remote(self.shared.inventory.list(environment_id)).await
    }

    /// Run one remote call under the in-flight limit, racing cancellation.
    async fn remote<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let _permit = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            permit = self.shared.limiter.acquire() => permit.map_err(|_| Error::Cancelled)?,
        };
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = call => result,
        }
    }
}
