//! Parallel expansion of the organization hierarchy.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};
use tokio::task::JoinSet;
use tracing::Instrument;

use super::{FailurePolicy, Run};
use crate::error::{Error, Result};
use crate::models::{FailedBranch, Node, Organization};

/// Ids already reached during one traversal.
#[derive(Default)]
struct Visited(Mutex<HashSet<String>>);

impl Visited {
    fn claim(&self, id: &str) -> Result<()> {
        let mut seen = self.0.lock().expect("visited set lock poisoned");
        if seen.insert(id.to_string()) {
            Ok(())
        } else {
            Err(Error::Cycle(id.to_string()))
        }
    }
}

pub(super) async fn build(run: Run, root_id: &str) -> Result<Node> {
    let visited = Arc::new(Visited::default());
    visited.claim(root_id)?;

    let organization = run.resolve(root_id).await?;
    tracing::info!(
        "Resolved root organization {} ({}) with {} children",
        organization.name,
        organization.id,
        organization.sub_organization_ids.len()
    );

    expand(run, visited, organization).await
}

async fn resolve_child(run: Run, visited: Arc<Visited>, id: String) -> Result<Node> {
    visited.claim(&id)?;
    let organization = run.resolve(&id).await?;
    tracing::debug!(
        "Resolved organization {} ({}) with {} children",
        organization.name,
        organization.id,
        organization.sub_organization_ids.len()
    );
    expand(run, visited, organization).await
}

fn expand(run: Run, visited: Arc<Visited>, organization: Organization) -> BoxFuture<'static, Result<Node>> {
    expand_children(run, visited, organization).boxed()
}

/// Expand every child of `organization` and assemble its node.
///
/// Each child runs in its own task and returns its finished subtree. The
/// `JoinSet` is owned by this future, so returning early (or being dropped)
/// aborts every child still running.
async fn expand_children(run: Run, visited: Arc<Visited>, organization: Organization) -> Result<Node> {
    let count = organization.sub_organization_ids.len();
    let mut tasks = JoinSet::new();
    for (slot, child_id) in organization.sub_organization_ids.iter().cloned().enumerate() {
        let run = run.clone();
        let visited = Arc::clone(&visited);
        tasks.spawn(
            async move {
                let result = resolve_child(run, visited, child_id.clone()).await;
                (slot, child_id, result)
            }
            .in_current_span(),
        );
    }

    let mut node = Node::new(organization);
    let mut slots: Vec<Option<Node>> = vec![None; count];
    let mut failed = Vec::new();
    let mut cancelled = None;

    while let Some(joined) = tasks.join_next().await {
        let (slot, child_id, result) = joined.map_err(|e| {
            run.abort();
            Error::from(e)
        })?;
        match result {
            Ok(child) => slots[slot] = Some(child),
            // The failure that cancelled the pass may still be on its way up
            // through a sibling, so keep draining.
            Err(e) if e.is_cancelled() => cancelled = Some(e),
            // The directory answered but refused this organization; the rest
            // of the hierarchy is still reachable.
            Err(e @ Error::RemoteStatus { .. }) => {
                tracing::warn!(
                    "Skipping organization {} under {}: {}",
                    child_id,
                    node.id(),
                    e
                );
                failed.push((slot, FailedBranch::new(child_id, &e)));
            }
            Err(e) => match run.policy() {
                FailurePolicy::FailFast => {
                    tracing::error!("Failed to expand organization {}: {}", child_id, e);
                    run.abort();
                    return Err(e);
                }
                FailurePolicy::Bulkhead => {
                    tracing::warn!(
                        "Skipping organization {} under {}: {}",
                        child_id,
                        node.id(),
                        e
                    );
                    failed.push((slot, FailedBranch::new(child_id, &e)));
                }
            },
        }
    }
    if let Some(e) = cancelled {
        return Err(e);
    }

    // Slots keep discovery order regardless of completion order.
    failed.sort_by_key(|(slot, _)| *slot);
    node.children = slots.into_iter().flatten().collect();
    node.failed_branches = failed.into_iter().map(|(_, branch)| branch).collect();
    Ok(node)
}
