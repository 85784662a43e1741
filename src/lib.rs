//! Concurrent crawler for organization hierarchies and the applications
//! deployed in their environments.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod render;

pub use error::{Error, Result};
