use std::any::Any;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker initialization failed: {0}")]
    InitializationError(String),

    #[error("Job aborted before completion")]
    Aborted,

    #[error("Worker pool is shut down")]
    ShutDown,

    #[error("Worker panicked: {0}")]
    Panicked(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

// The only acquire failure is a closed semaphore
impl From<tokio::sync::AcquireError> for WorkerError {
    fn from(_: tokio::sync::AcquireError) -> Self {
        WorkerError::ShutDown
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            WorkerError::Panicked(panic_message(err.into_panic().as_ref()))
        } else {
            WorkerError::ShutDown
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
