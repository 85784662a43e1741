//! Second pass: fetch the applications of every environment.

use futures::future::{join_all, BoxFuture, FutureExt};
use tokio::task::JoinSet;
use tracing::Instrument;

use super::{FailurePolicy, Run};
use crate::error::{Error, Result};
use crate::models::{Node, Organization};

pub(super) fn enrich(run: Run, node: Node) -> BoxFuture<'static, Result<Node>> {
    enrich_subtree(run, node).boxed()
}

/// Enrich `node` and, in parallel, all of its descendants.
///
/// The tree's shape is fixed at this point. Every node is moved into exactly
/// one task, so each environment has a single writer and no lock is needed.
async fn enrich_subtree(run: Run, mut node: Node) -> Result<Node> {
    let children = std::mem::take(&mut node.children);
    let mut tasks = JoinSet::new();
    for (slot, child) in children.into_iter().enumerate() {
        let run = run.clone();
        tasks.spawn(async move { (slot, enrich(run, child).await) }.in_current_span());
    }

    // A cancellation may have been triggered by a failure in a sibling
    // subtree, so keep draining children until that failure shows up.
    let mut cancelled = match enrich_environments(&run, &mut node.organization).await {
        Ok(()) => None,
        Err(e) if e.is_cancelled() => Some(e),
        Err(e) => return Err(e),
    };

    let mut slots: Vec<Option<Node>> = vec![None; tasks.len()];
    while let Some(joined) = tasks.join_next().await {
        let (slot, result) = joined.map_err(|e| {
            run.abort();
            Error::from(e)
        })?;
        match result {
            Ok(child) => slots[slot] = Some(child),
            Err(e) if e.is_cancelled() => cancelled = Some(e),
            Err(e) => return Err(e),
        }
    }
    if let Some(e) = cancelled {
        return Err(e);
    }

    node.children = slots.into_iter().flatten().collect();
    Ok(node)
}

async fn enrich_environments(run: &Run, organization: &mut Organization) -> Result<()> {
    let fetches = organization
        .environments
        .iter()
        .map(|environment| run.list(&environment.id));
    let results = join_all(fetches).await;

    for (environment, result) in organization.environments.iter_mut().zip(results) {
        match result {
            Ok(applications) => {
                tracing::debug!(
                    "Environment {} of {} has {} applications",
                    environment.name,
                    organization.name,
                    applications.len()
                );
                environment.set_applications(applications);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => match run.policy() {
                FailurePolicy::FailFast => {
                    tracing::error!(
                        "Failed to list applications in environment {}: {}",
                        environment.id,
                        e
                    );
                    run.abort();
                    return Err(e);
                }
                FailurePolicy::Bulkhead => {
                    tracing::warn!(
                        "Skipping environment {} of {}: {}",
                        environment.id,
                        organization.name,
                        e
                    );
                    environment.record_failure(&e);
                }
            },
        }
    }
    Ok(())
}
