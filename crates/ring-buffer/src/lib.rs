//! Bounded Ring Buffer
//!
//! Fixed-capacity FIFO history. When full, pushing evicts the oldest entry.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};

use thiserror::Error;

/// Errors constructing a ring buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("Ring buffer capacity must be greater than zero")]
    ZeroCapacity,
}
