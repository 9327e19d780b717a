mod error;
mod pool;

pub use error::{WorkerError, WorkerResult, panic_message};
pub use pool::{DEFAULT_IDLE_TIMEOUT, WorkerPool, default_slots};
