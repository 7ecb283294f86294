//! Storage Layer
//!
//! Bounded per-machine reading windows, the global alert history and the
//! process-wide counters.

mod store;

pub use store::{MachineState, MachineSummary, MonitorStats, WindowStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid window capacity: {0}")]
    InvalidCapacity(#[from] ring_buffer::BufferError),
}
