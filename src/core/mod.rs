//! Core types and process state.
//!
//! - [`ImageInput`]: what to minify
//! - [`EncodeJob`]: one unit of work for the pool
//! - [`EncodeResult`]: what a worker returns
//! - [`MinifyOutcome`]: what the minifier decided
//! - [`PoolGuard`]: owns the process-wide worker pool

mod state;
mod task;
mod types;

pub use state::{PoolGuard, install_shared_pool, shared_pool, shutdown_shared_pool};
pub use task::EncodeJob;
pub use types::{EncodeResult, ImageInput, MinifyOutcome};
