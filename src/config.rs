//! Crawl configuration.
//!
//! Everything a run needs is carried in an explicit [`CrawlConfig`] value that
//! is handed to each component, instead of living in process-wide state. The
//! binary fills it from command-line flags with environment fallbacks:
//! - `ORGCRAWL_ROOT_ID` - id of the root organization
//! - `ORGCRAWL_USERNAME` / `ORGCRAWL_PASSWORD` - basic-auth credentials
//! - `ORGCRAWL_BASE_URL` - API base URL (default: `https://anypoint.mulesoft.com`)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::{EngineOptions, FailurePolicy, FlatKey};
use crate::error::{Error, Result};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://anypoint.mulesoft.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Basic-auth credentials for the remote services.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub root_id: String,
    pub credentials: Credentials,
    pub base_url: String,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub engine: EngineOptions,
    pub flat_key: FlatKey,
}

impl CrawlConfig {
    /// Validate the required identifying settings.
    ///
    /// Empty values count as missing. All missing settings are reported
    /// together so the user can fix them in one go.
    pub fn new(
        root_id: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (root_id, username, password) = (present(root_id), present(username), present(password));

        let mut missing = Vec::new();
        if root_id.is_none() {
            missing.push("--root-id");
        }
        if username.is_none() {
            missing.push("--username");
        }
        if password.is_none() {
            missing.push("--password");
        }

        match (root_id, username, password) {
            (Some(root_id), Some(username), Some(password)) => Ok(Self {
                root_id,
                credentials: Credentials { username, password },
                base_url: DEFAULT_BASE_URL.to_string(),
                output_dir: PathBuf::from("."),
                request_timeout: DEFAULT_TIMEOUT,
                engine: EngineOptions::default(),
                flat_key: FlatKey::default(),
            }),
            _ => Err(Error::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            ))),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.engine.policy = policy;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Result<Self> {
        if max_in_flight == 0 {
            return Err(Error::Configuration(
                "--max-in-flight must be at least 1".to_string(),
            ));
        }
        self.engine.max_in_flight = max_in_flight;
        Ok(self)
    }

    pub fn with_flat_key(mut self, flat_key: FlatKey) -> Self {
        self.flat_key = flat_key;
        self
    }

    /// Path of the nested tree snapshot.
    pub fn tree_path(&self) -> PathBuf {
        self.output_dir.join("metrics.json")
    }

    /// Path of the flattened snapshot.
    pub fn flat_path(&self) -> PathBuf {
        self.output_dir.join("metrics_flat.json")
    }
}
