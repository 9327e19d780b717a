//! The encode worker: one input in, one [`EncodeResult`] out.
//!
//! Runs on a pool thread. Nothing escapes it: classification failures, codec
//! errors and codec panics all come back as `EncodeResult::Error`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::classify::classify;
use super::codec::{Codec, EncodeOptions};
use super::marker::{has_marker, with_marker};
use crate::config::MinifyConfig;
use crate::core::{EncodeJob, EncodeResult, ImageInput};
use crate::utils::{OptimizerError, OptimizerResult, read_file_blocking};
use crate::worker::panic_message;

/// Encodes a job, catching panics from the codec.
pub fn encode(job: &EncodeJob, cancel: &CancellationToken) -> EncodeResult {
    match catch_unwind(AssertUnwindSafe(|| try_encode(job, cancel))) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => EncodeResult::error(err.to_string()),
        Err(payload) => EncodeResult::error(format!(
            "codec panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

/// Reads `input` (blocking) and encodes it.
pub fn encode_input(
    input: &ImageInput,
    config: Arc<MinifyConfig>,
    codec: Arc<dyn Codec>,
    cancel: &CancellationToken,
) -> EncodeResult {
    let (bytes, path): (Arc<[u8]>, Option<PathBuf>) = match input {
        ImageInput::Buffer(bytes) => (Arc::from(bytes.as_slice()), None),
        ImageInput::Path(path) => match read_file_blocking(path) {
            Ok(bytes) => (Arc::from(bytes), Some(path.clone())),
            Err(err) => return EncodeResult::error(err.to_string()),
        },
    };
    encode(&EncodeJob::new(bytes, path, config, codec), cancel)
}

fn checkpoint(cancel: &CancellationToken) -> OptimizerResult<()> {
    if cancel.is_cancelled() {
        Err(OptimizerError::encode("aborted"))
    } else {
        Ok(())
    }
}

fn try_encode(job: &EncodeJob, cancel: &CancellationToken) -> OptimizerResult<EncodeResult> {
    checkpoint(cancel)?;
    let classified = classify(&job.bytes, job.path.as_deref())?;
    let format = classified.format;
    debug!("Classified {} as {}", job.identifier(), format);
    checkpoint(cancel)?;

    if format.is_vector() {
        let source = std::str::from_utf8(&job.bytes)
            .map_err(|e| OptimizerError::encode(format!("SVG is not valid UTF-8: {e}")))?;
        let bytes = job.codec.optimize_svg(source, &job.config.svg)?;
        return Ok(EncodeResult::Success { bytes });
    }

    if has_marker(&classified.metadata) {
        return Ok(EncodeResult::Skip);
    }

    let options = with_marker(
        EncodeOptions::new(job.config.format_options(format))
            .with_orientation(classified.metadata.orientation),
    );
    let bytes = job.codec.encode_raster(&job.bytes, format, &options)?;
    checkpoint(cancel)?;
    Ok(EncodeResult::Success { bytes })
}
