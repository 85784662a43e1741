use serde::{Deserialize, Serialize};

use super::Environment;

/// A business organization as reported by the remote directory.
///
/// `sub_organization_ids` is the child list captured at discovery time and is
/// never modified afterwards; the discovered children themselves live on
/// [`Node::children`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sub_organization_ids: Vec<String>,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

impl Organization {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_children<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_organization_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environments.push(environment);
        self
    }
}

/// An organization placed in the discovered hierarchy.
///
/// A node owns its children outright. Once the tree builder hands a node back,
/// `children` holds one entry per id in `organization.sub_organization_ids`,
/// except for branches listed in `failed_branches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub organization: Organization,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_branches: Vec<FailedBranch>,
}

impl Node {
    pub fn new(organization: Organization) -> Self {
        Self {
            organization,
            children: Vec::new(),
            failed_branches: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.organization.id
    }

    pub fn name(&self) -> &str {
        &self.organization.name
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Depth-first, pre-order iterator over this subtree.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Finds a node in this subtree by organization id.
    pub fn find(&self, id: &str) -> Option<&Node> {
        self.iter().find(|node| node.id() == id)
    }

    /// Every failed branch recorded anywhere in this subtree.
    pub fn failures(&self) -> impl Iterator<Item = &FailedBranch> {
        self.iter().flat_map(|node| node.failed_branches.iter())
    }
}

/// A child organization whose expansion failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBranch {
    pub id: String,
    pub error: String,
}

impl FailedBranch {
    pub fn new(id: impl Into<String>, error: &crate::Error) -> Self {
        Self {
            id: id.into(),
            error: error.to_string(),
        }
    }
}
