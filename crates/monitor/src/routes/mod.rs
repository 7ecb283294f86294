//! Status API routes

pub mod alerts;
pub mod health;
pub mod machines;
pub mod stats;
