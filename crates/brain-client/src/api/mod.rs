//! Typed Brain operations.

mod client;
pub mod types;

pub use client::{BrainClient, PULL_TIMEOUT};
pub use types::*;
