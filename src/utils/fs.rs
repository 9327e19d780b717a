use std::path::Path;
use tokio::fs;
use crate::utils::{OptimizerError, OptimizerResult};

/// Read a whole file, attaching the path to any IO error
pub async fn read_file(path: impl AsRef<Path>) -> OptimizerResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path)
        .await
        .map_err(|e| OptimizerError::io(path, e))
}

/// Overwrite a file with `contents`
pub async fn write_file(path: impl AsRef<Path>, contents: &[u8]) -> OptimizerResult<()> {
    let path = path.as_ref();
    fs::write(path, contents)
        .await
        .map_err(|e| OptimizerError::io(path, e))
}

/// Blocking read for use inside worker threads
pub fn read_file_blocking(path: &Path) -> OptimizerResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| OptimizerError::io(path, e))
}
