#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image_lint_staged::config::SvgOptions;
use image_lint_staged::processing::metadata::{self, Stamp};
use image_lint_staged::utils::ImageFormat;
use image_lint_staged::{Codec, EncodeOptions, MinifyConfig, Minifier, OptimizerResult, WorkerPool};

/// Structurally valid JPEG of exactly `len` bytes, padded with COM segments.
pub fn jpeg_fixture(len: usize) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(&[
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
        0x01, 0x00, 0x00,
    ]);
    let sos = [0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00];
    let eoi = [0xFF, 0xD9];

    let mut remaining = len - out.len() - sos.len() - eoi.len();
    while remaining > 0 {
        let mut chunk = remaining.min(60_004);
        if (1..4).contains(&(remaining - chunk)) {
            chunk -= 4;
        }
        let payload = chunk - 4;
        out.extend_from_slice(&[0xFF, 0xFE]);
        out.extend_from_slice(&((payload + 2) as u16).to_be_bytes());
        out.extend(std::iter::repeat_n(b'x', payload));
        remaining -= chunk;
    }

    out.extend_from_slice(&sos);
    out.extend_from_slice(&eoi);
    assert_eq!(out.len(), len);
    out
}

/// PNG signature followed by filler; classification only needs the signature.
pub fn png_fixture(len: usize) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    out.resize(len, 0);
    out
}

/// Fake codec producing outputs of a fixed size, counting calls.
pub struct SizedCodec {
    pub raster_len: usize,
    pub raster_calls: AtomicUsize,
    pub svg_calls: AtomicUsize,
}

impl SizedCodec {
    pub fn new(raster_len: usize) -> Arc<Self> {
        Arc::new(Self {
            raster_len,
            raster_calls: AtomicUsize::new(0),
            svg_calls: AtomicUsize::new(0),
        })
    }

    pub fn raster_calls(&self) -> usize {
        self.raster_calls.load(Ordering::SeqCst)
    }

    pub fn svg_calls(&self) -> usize {
        self.svg_calls.load(Ordering::SeqCst)
    }
}

impl Codec for SizedCodec {
    fn encode_raster(
        &self,
        _input: &[u8],
        format: ImageFormat,
        options: &EncodeOptions,
    ) -> OptimizerResult<Vec<u8>> {
        self.raster_calls.fetch_add(1, Ordering::SeqCst);
        if format != ImageFormat::Jpeg {
            return Ok(vec![0; self.raster_len]);
        }
        let stamp = Stamp {
            description: options.marker,
            orientation: options.orientation,
        };
        // size the padding so the stamped output lands on raster_len exactly
        let probe = metadata::stamp(format, &jpeg_fixture(self.raster_len), &stamp)?;
        let overhead = probe.len() - self.raster_len;
        metadata::stamp(format, &jpeg_fixture(self.raster_len - overhead), &stamp)
    }

    fn optimize_svg(&self, source: &str, _options: &SvgOptions) -> OptimizerResult<Vec<u8>> {
        self.svg_calls.fetch_add(1, Ordering::SeqCst);
        Ok(source.split_whitespace().collect::<Vec<_>>().join(" ").into_bytes())
    }
}

pub fn minifier(config: MinifyConfig, codec: Arc<dyn Codec>) -> Minifier {
    Minifier::with_parts(config, Arc::new(WorkerPool::new(2)), codec)
}
