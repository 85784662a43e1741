//! Error type shared by the crawler, its HTTP client and the output writer.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source for transport failures, so collaborators other than the
/// HTTP client can report them too.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Required settings were missing or invalid. Raised before any work starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote call could not be made at all.
    #[error("Request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: BoxError,
    },

    /// The remote answered with a non-success status.
    #[error("{target} returned HTTP {status}: {body}")]
    RemoteStatus {
        target: String,
        status: u16,
        body: String,
    },

    #[error("Could not decode response from {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An organization was reached twice within one traversal.
    #[error("Organization {0} was reached more than once; the hierarchy contains a cycle")]
    Cycle(String),

    #[error("Crawl cancelled")]
    Cancelled,

    /// A crawl task panicked or was aborted unexpectedly.
    #[error("Crawl task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    pub fn transport(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskFailed(e.to_string())
    }
}
