//! Minify orchestrator: read, encode on the pool, decide, persist, report.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::codec::{Codec, NativeCodec};
use super::encoder::encode;
use crate::config::MinifyConfig;
use crate::core::{EncodeJob, EncodeResult, ImageInput, MinifyOutcome, shared_pool};
use crate::utils::{OptimizerError, OptimizerResult, compute_savings, pretty_bytes, read_file, write_file};
use crate::worker::{WorkerError, WorkerPool};

/// Minifies single inputs. Cheap to clone; clones share the pool and codec.
#[derive(Clone)]
pub struct Minifier {
    pool: Arc<WorkerPool>,
    codec: Arc<dyn Codec>,
    config: Arc<MinifyConfig>,
}

impl Minifier {
    /// Native codec on the shared pool.
    pub fn new(config: MinifyConfig) -> Self {
        Self::with_parts(config, shared_pool(), Arc::new(NativeCodec))
    }

    pub fn with_parts(config: MinifyConfig, pool: Arc<WorkerPool>, codec: Arc<dyn Codec>) -> Self {
        Self {
            pool,
            codec,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MinifyConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub async fn minify(&self, input: &ImageInput) -> OptimizerResult<MinifyOutcome> {
        self.minify_with_cancel(input, &CancellationToken::new()).await
    }

    /// Runs one input through the accept/skip policy.
    ///
    /// IO failures and, unless `silentErrors` is set, encode failures are
    /// returned as errors. Everything else is an outcome.
    pub async fn minify_with_cancel(
        &self,
        input: &ImageInput,
        cancel: &CancellationToken,
    ) -> OptimizerResult<MinifyOutcome> {
        let identifier = input.identifier();
        let original: Arc<[u8]> = match input {
            ImageInput::Buffer(bytes) => Arc::from(bytes.as_slice()),
            ImageInput::Path(path) => Arc::from(read_file(path).await?),
        };

        let job = EncodeJob::new(
            original.clone(),
            input.path().map(|p| p.to_path_buf()),
            self.config.clone(),
            self.codec.clone(),
        );
        let result = match self
            .pool
            .submit(cancel, move |token| encode(&job, token))
            .await
        {
            Ok(result) => result,
            Err(WorkerError::Panicked(message)) => EncodeResult::error(message),
            Err(err) => return Err(err.into()),
        };

        let optimized = match result {
            EncodeResult::Skip => {
                info!(
                    "🟡 Skipping {} - already optimized at {}",
                    identifier,
                    pretty_bytes(original.len() as i64)
                );
                return Ok(MinifyOutcome::AlreadyOptimized {
                    size: original.len() as u64,
                });
            }
            EncodeResult::Error { message } => {
                error!("🔴 {} - {}", identifier, message);
                if self.config.silent_errors {
                    return Ok(MinifyOutcome::Failed { message });
                }
                return Err(OptimizerError::fatal(identifier, message));
            }
            EncodeResult::Success { bytes } => bytes,
        };

        let savings = compute_savings(&original, &optimized);
        let span = format!(
            "({} → {})",
            savings.original_size.display, savings.optimized_size.display
        );

        if savings.is_regression() {
            warn!(
                "🟠 Minified file is larger {} \"{}\" - skipping, adjust configs and try again",
                span, identifier
            );
            return Ok(MinifyOutcome::Larger { savings });
        }

        let threshold = i64::try_from(self.config.skip_delta).unwrap_or(i64::MAX);
        if savings.saved.count < threshold {
            warn!(
                "🟠 Minification delta below threshold {} \"{}\" - skipping, adjust configs and try again",
                span, identifier
            );
            return Ok(MinifyOutcome::BelowThreshold { savings });
        }

        let buffer = match input {
            ImageInput::Path(path) => {
                write_file(path, &optimized).await?;
                None
            }
            ImageInput::Buffer(_) => Some(optimized),
        };
        if self.config.show_savings {
            match input {
                ImageInput::Path(_) => {
                    info!("✅ Saved {} on {} {}", savings.saved.display, identifier, span)
                }
                ImageInput::Buffer(_) => info!("✅ Saved {} (buffer) {}", savings.saved.display, span),
            }
        }
        Ok(MinifyOutcome::Minified { savings, buffer })
    }
}

impl std::fmt::Debug for Minifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Minifier")
            .field("slots", &self.pool.slots())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
