//! docgraph-core: Shared types, findings, errors and configuration for docgraph.

pub mod config;
pub mod error;
pub mod findings;
pub mod types;

pub use config::*;
pub use error::*;
pub use findings::*;
pub use types::*;
