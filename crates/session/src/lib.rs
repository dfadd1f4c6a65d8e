//! Comparison session: the state machine that turns dataset, algorithm and
//! tolerance choices into a consistent cache of simplified layers and
//! metrics, and the async driver that runs it against the external services.

pub mod error;
pub mod export;
pub mod metrics;
pub mod service;
pub mod state;
pub mod workbench;

#[cfg(test)]
pub(crate) mod testing;

pub use error::*;
pub use export::*;
pub use metrics::*;
pub use service::*;
pub use state::*;
pub use workbench::*;
