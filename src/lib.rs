// Module declarations in dependency order
pub mod config;
pub mod core;
pub mod processing;
pub mod utils;
pub mod worker;

// Public exports for external consumers
pub use config::{ConfigLoader, ConfigOverrides, MinifyConfig};
pub use core::{EncodeResult, ImageInput, MinifyOutcome, PoolGuard};
pub use processing::{BatchSummary, Codec, EncodeOptions, Minifier, NativeCodec};
pub use utils::{OptimizerError, OptimizerResult, Savings, compute_savings};
pub use worker::{WorkerError, WorkerPool};

// The command-line entry point lives in main.rs.
