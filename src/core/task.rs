//! Encode job definition.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::MinifyConfig;
use crate::processing::Codec;

/// Everything a worker needs to encode one input.
///
/// Moved into the worker thread whole, so it owns its data.
#[derive(Clone)]
pub struct EncodeJob {
    /// Source bytes
    pub bytes: Arc<[u8]>,
    /// Originating path, for the extension fallback and messages
    pub path: Option<PathBuf>,
    pub config: Arc<MinifyConfig>,
    pub codec: Arc<dyn Codec>,
}

impl EncodeJob {
    pub fn new(
        bytes: Arc<[u8]>,
        path: Option<PathBuf>,
        config: Arc<MinifyConfig>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        Self {
            bytes,
            path,
            config,
            codec,
        }
    }

    pub fn identifier(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "buffer".to_string())
    }
}

impl std::fmt::Debug for EncodeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeJob")
            .field("bytes", &self.bytes.len())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
