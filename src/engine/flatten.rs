//! Projection of the hierarchy into a flat index.

use std::collections::BTreeMap;

use crate::models::{Node, Organization};

/// Organization snapshots keyed by [`FlatKey`].
pub type FlatIndex = BTreeMap<String, Organization>;

/// Which organization attribute keys the flat index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FlatKey {
    /// Display name. Organizations sharing a name collapse into one entry.
    #[default]
    Name,
    /// Organization id; always unique.
    Id,
}

impl FlatKey {
    fn of(self, organization: &Organization) -> &str {
        match self {
            Self::Name => &organization.name,
            Self::Id => &organization.id,
        }
    }
}

/// Depth-first walk collecting every organization in the tree.
///
/// Only meaningful once building and enrichment have finished. When two
/// organizations share a key the one visited later wins, and a warning is
/// logged.
pub fn flatten(root: &Node, key: FlatKey) -> FlatIndex {
    let mut index = FlatIndex::new();
    for node in root.iter() {
        let organization = &node.organization;
        let k = key.of(organization).to_string();
        if let Some(previous) = index.insert(k.clone(), organization.clone()) {
            tracing::warn!(
                "Flat key {:?} is shared by organizations {} and {}; keeping {}",
                k,
                previous.id,
                organization.id,
                organization.id
            );
        }
    }
    index
}
