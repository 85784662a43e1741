use serde::{Deserialize, Serialize};

use super::Application;

/// A deployment environment belonging to one organization.
///
/// `applications` stays `None` until the enrichment pass has fetched the
/// environment's inventory. Enriching again replaces the list rather than
/// appending to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Application>>,
    /// Why the inventory could not be fetched, when the crawl tolerated it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
}

impl Environment {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn set_applications(&mut self, applications: Vec<Application>) {
        self.applications = Some(applications);
        self.enrichment_error = None;
    }

    pub fn record_failure(&mut self, error: impl ToString) {
        self.applications = None;
        self.enrichment_error = Some(error.to_string());
    }

    pub fn is_enriched(&self) -> bool {
        self.applications.is_some()
    }

    /// Applications fetched so far; empty when not yet enriched.
    pub fn applications(&self) -> &[Application] {
        self.applications.as_deref().unwrap_or_default()
    }
}
