//! Batch runner: minify many inputs concurrently with per-input isolation.

use futures::future::try_join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::minify::Minifier;
use crate::core::{ImageInput, MinifyOutcome};
use crate::utils::{OptimizerResult, Savings, pretty_bytes};

/// Totals over one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub minified: usize,
    pub already_optimized: usize,
    pub discarded: usize,
    pub failed: usize,
    pub bytes_saved: i64,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[MinifyOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                MinifyOutcome::Minified { savings, .. } => {
                    summary.minified += 1;
                    summary.bytes_saved += savings.saved.count;
                }
                MinifyOutcome::AlreadyOptimized { .. } => summary.already_optimized += 1,
                MinifyOutcome::Larger { .. } | MinifyOutcome::BelowThreshold { .. } => {
                    summary.discarded += 1
                }
                MinifyOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

impl Minifier {
    /// Minifies every input, returning savings per input in input order.
    ///
    /// `None` marks inputs that were skipped as already optimized or that
    /// failed under `silentErrors`.
    pub async fn run_all(&self, inputs: &[ImageInput]) -> OptimizerResult<Vec<Option<Savings>>> {
        let outcomes = self.run_all_outcomes(inputs).await?;
        Ok(outcomes.into_iter().map(MinifyOutcome::into_savings).collect())
    }

    /// Like [`run_all`](Self::run_all), keeping the full outcome per input.
    ///
    /// With `silentErrors` off, the first error cancels the inputs still
    /// queued or running and is returned.
    pub async fn run_all_outcomes(&self, inputs: &[ImageInput]) -> OptimizerResult<Vec<MinifyOutcome>> {
        let batch = CancellationToken::new();
        debug!("Minifying batch of {} inputs", inputs.len());

        let tasks = inputs.iter().map(|input| {
            let cancel = batch.child_token();
            let batch = batch.clone();
            async move {
                match self.minify_with_cancel(input, &cancel).await {
                    Ok(outcome) => Ok(outcome),
                    Err(err) if self.config().silent_errors => {
                        error!("🔴 {} - {}", input.identifier(), err);
                        Ok(MinifyOutcome::Failed {
                            message: err.to_string(),
                        })
                    }
                    Err(err) => {
                        batch.cancel();
                        Err(err)
                    }
                }
            }
        });

        let outcomes = try_join_all(tasks).await?;

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            "Processed {} files: {} minified, {} already optimized, {} discarded, {} failed (saved {})",
            summary.total,
            summary.minified,
            summary.already_optimized,
            summary.discarded,
            summary.failed,
            pretty_bytes(summary.bytes_saved)
        );
        Ok(outcomes)
    }
}
