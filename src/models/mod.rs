//! Domain models for the organization crawler.
//!
//! # Core Concepts
//!
//! - [`Organization`]: the snapshot of one business organization as returned by
//!   the remote directory, including the ids of its sub-organizations.
//! - [`Node`]: an organization placed in the discovered hierarchy, owning its
//!   child nodes.
//! - [`Environment`]: a deployment environment owned by an organization. Its
//!   application list is filled in by the enrichment pass.
//! - [`Application`]: one deployed application, immutable once fetched.

mod application;
mod environment;
mod organization;

pub use application::*;
pub use environment::*;
pub use organization::*;
