//! Parallel search for applications by domain.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::{FailurePolicy, Run, WorkTracker};
use crate::error::{Error, Result};
use crate::models::{Application, Environment, Node, Organization};

/// An application found by [`super::Crawler::find_by_domain`].
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMatch {
    pub organization_id: String,
    pub organization_name: String,
    pub environment_id: String,
    pub environment_name: String,
    pub application: Application,
}

type Report = Result<DomainMatch>;

pub(super) async fn find_by_domain(run: Run, root: &Node, domain: &str) -> Result<Vec<DomainMatch>> {
    let tracker = WorkTracker::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let domain: Arc<str> = Arc::from(domain);

    spawn_search(&run, &tracker, root.clone(), &domain, &tx);
    tracker.wait().await;
    drop(tx);

    let mut matches = Vec::new();
    let mut failure: Option<Error> = None;
    while let Some(report) = rx.recv().await {
        match report {
            Ok(found) => matches.push(found),
            // Keep the root cause rather than the cancellations it triggered.
            Err(e) => match &failure {
                Some(existing) if !existing.is_cancelled() => {}
                _ => failure = Some(e),
            },
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    matches.sort_by(|a, b| {
        (&a.organization_id, &a.environment_id, &a.application.full_domain).cmp(&(
            &b.organization_id,
            &b.environment_id,
            &b.application.full_domain,
        ))
    });
    tracing::info!("Found {} applications with domain {}", matches.len(), domain);
    Ok(matches)
}

/// Search `node` in a detached task, then fan out to its children.
fn spawn_search(
    run: &Run,
    tracker: &WorkTracker,
    node: Node,
    domain: &Arc<str>,
    tx: &mpsc::UnboundedSender<Report>,
) {
    // Registered before the task exists, while the spawning task still holds its own unit.
    let guard = tracker.guard();
    let run = run.clone();
    let tracker = tracker.clone();
    let domain = Arc::clone(domain);
    let tx = tx.clone();

    tokio::spawn(
        async move {
            let _guard = guard;
            let Node {
                organization,
                children,
                ..
            } = node;

            for child in children {
                spawn_search(&run, &tracker, child, &domain, &tx);
            }

            if let Err(e) = scan(&run, &organization, &domain, &tx).await {
                run.abort();
                let _ = tx.send(Err(e));
            }
        }
        .in_current_span(),
    );
}

/// Report every matching application in the organization's environments.
async fn scan(
    run: &Run,
    organization: &Organization,
    domain: &str,
    tx: &mpsc::UnboundedSender<Report>,
) -> Result<()> {
    let lookups = organization
        .environments
        .iter()
        .map(|environment| applications_of(run, environment));
    let results = join_all(lookups).await;

    for (environment, lookup) in organization.environments.iter().zip(results) {
        let applications = match lookup {
            Ok(applications) => applications,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => match run.policy() {
                FailurePolicy::FailFast => return Err(e),
                FailurePolicy::Bulkhead => {
                    tracing::warn!(
                        "Could not search environment {} of {}: {}",
                        environment.id,
                        organization.name,
                        e
                    );
                    continue;
                }
            },
        };

        for application in applications.into_iter().filter(|app| app.domain == domain) {
            tracing::debug!(
                "Found {} in {}/{}",
                application.domain,
                organization.name,
                environment.name
            );
            let _ = tx.send(Ok(DomainMatch {
                organization_id: organization.id.clone(),
                organization_name: organization.name.clone(),
                environment_id: environment.id.clone(),
                environment_name: environment.name.clone(),
                application,
            }));
        }
    }
    Ok(())
}

/// Enriched applications if present, otherwise a fresh inventory listing.
async fn applications_of(run: &Run, environment: &Environment) -> Result<Vec<Application>> {
    match &environment.applications {
        Some(applications) => Ok(applications.clone()),
        None => run.list(&environment.id).await,
    }
}
