//! Remote collaborators of the crawl engine.
//!
//! The engine only sees the two traits below. [`AnypointClient`] implements
//! both over HTTP; tests substitute in-memory fakes.

mod anypoint;

pub use anypoint::AnypointClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Application, Organization};

/// Resolves an organization id to its attributes, child ids and environments.
///
/// Must be safe to call concurrently for distinct ids.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    async fn resolve(&self, id: &str) -> Result<Organization>;
}

/// Lists the applications deployed into an environment.
///
/// Must be safe to call concurrently for distinct ids.
#[async_trait]
pub trait RemoteInventory: Send + Sync {
    async fn list(&self, environment_id: &str) -> Result<Vec<Application>>;
}
