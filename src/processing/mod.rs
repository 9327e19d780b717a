//! Minification pipeline.
//!
//! ```text
//! batch → minify → worker pool → encoder → { classify, marker, codec }
//! ```

mod batch;
pub mod classify;
pub mod codec;
mod encoder;
pub mod marker;
pub mod metadata;
mod minify;

pub use batch::BatchSummary;
pub use classify::{Classified, classify};
pub use codec::{Codec, EncodeOptions, NativeCodec};
pub use encoder::{encode, encode_input};
pub use marker::{MARKER, has_marker, with_marker};
pub use metadata::ImageMetadata;
pub use minify::Minifier;
