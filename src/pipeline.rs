//! End-to-end crawl: discover, enrich, flatten, write.

use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::CrawlConfig;
use crate::engine::{flatten, Crawler, FlatIndex};
use crate::error::Result;
use crate::models::Node;
use crate::output;

/// Outcome of a completed crawl.
#[derive(Debug)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub tree: Node,
    pub flat: FlatIndex,
    pub tree_bytes: usize,
    pub flat_bytes: usize,
    pub elapsed: Duration,
}

/// Run a full crawl and write both snapshots.
///
/// Nothing is written unless discovery and enrichment both succeed, and a
/// failed write leaves neither snapshot behind.
pub async fn run_crawl(crawler: &Crawler, config: &CrawlConfig) -> Result<CrawlReport> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("crawl", %run_id, root = %config.root_id);
    crawl(crawler, config, run_id).instrument(span).await
}

async fn crawl(crawler: &Crawler, config: &CrawlConfig, run_id: Uuid) -> Result<CrawlReport> {
    let started = Instant::now();

    let tree = crawler.build_tree(&config.root_id).await?;
    tracing::info!(
        "Discovered {} organizations ({} failed branches)",
        tree.size(),
        tree.failures().count()
    );

    let tree = crawler.enrich(tree).await?;
    let flat = flatten(&tree, config.flat_key);
    for organization in flat.values() {
        tracing::debug!("Flattened organization {} ({})", organization.name, organization.id);
    }

    // Both snapshots are encoded before either file is touched.
    let snapshots = [
        output::Snapshot::encode(&tree, config.tree_path())?,
        output::Snapshot::encode(&output::flat_values(&flat), config.flat_path())?,
    ];
    let written = output::write_all(&snapshots)?;
    for snapshot in &snapshots {
        tracing::info!("Wrote {} bytes to {}", snapshot.size(), snapshot.path().display());
    }
    let (tree_bytes, flat_bytes) = (written[0], written[1]);

    Ok(CrawlReport {
        run_id,
        tree,
        flat,
        tree_bytes,
        flat_bytes,
        elapsed: started.elapsed(),
    })
}
