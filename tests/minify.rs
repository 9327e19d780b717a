mod common;

use std::sync::Arc;

use common::{SizedCodec, jpeg_fixture, minifier, png_fixture};
use image_lint_staged::processing::{MARKER, metadata};
use image_lint_staged::utils::ImageFormat;
use image_lint_staged::{ImageInput, MinifyConfig, MinifyOutcome, OptimizerError};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> ImageInput {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    ImageInput::Path(path)
}

fn read(input: &ImageInput) -> Vec<u8> {
    std::fs::read(input.path().unwrap()).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn jpeg_is_rewritten_with_marker_then_skipped() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "photo.jpg", &jpeg_fixture(50_000));
    let codec = SizedCodec::new(40_000);
    let minifier = minifier(MinifyConfig::default(), codec.clone());

    let outcome = minifier.minify(&input).await.unwrap();
    let MinifyOutcome::Minified { savings, buffer } = outcome else {
        panic!("expected Minified, got {outcome:?}");
    };
    assert!(buffer.is_none());
    assert_eq!(savings.saved.count, 10_000);
    assert_eq!(savings.saved.display, "10 kB");

    let written = read(&input);
    assert_eq!(written.len(), 40_000);
    let meta = metadata::read(ImageFormat::Jpeg, &written);
    assert_eq!(meta.description.as_deref(), Some(MARKER));

    // second run sees the marker
    let again = minifier.minify(&input).await.unwrap();
    assert_eq!(again, MinifyOutcome::AlreadyOptimized { size: 40_000 });
    assert_eq!(read(&input), written);
    assert_eq!(codec.raster_calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn small_gain_is_below_threshold() {
    let dir = TempDir::new().unwrap();
    let original = png_fixture(1_000);
    let input = write(&dir, "icon.png", &original);
    let minifier = minifier(MinifyConfig::default(), SizedCodec::new(900));

    let outcome = minifier.minify(&input).await.unwrap();
    let MinifyOutcome::BelowThreshold { savings } = outcome else {
        panic!("expected BelowThreshold, got {outcome:?}");
    };
    assert_eq!(savings.saved.count, 100);
    assert_eq!(read(&input), original);
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_skip_delta_accepts_any_gain() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "icon.png", &png_fixture(1_000));
    let config = MinifyConfig {
        skip_delta: 0,
        ..MinifyConfig::default()
    };
    let minifier = minifier(config, SizedCodec::new(900));

    assert!(minifier.minify(&input).await.unwrap().is_written());
    assert_eq!(read(&input).len(), 900);
}

#[tokio::test(flavor = "multi_thread")]
async fn larger_output_is_discarded() {
    let dir = TempDir::new().unwrap();
    let original = png_fixture(1_000);
    let input = write(&dir, "icon.png", &original);
    let minifier = minifier(MinifyConfig::default(), SizedCodec::new(1_200));

    let outcome = minifier.minify(&input).await.unwrap();
    let MinifyOutcome::Larger { savings } = outcome else {
        panic!("expected Larger, got {outcome:?}");
    };
    assert_eq!(savings.saved.count, -200);
    assert_eq!(read(&input), original);
}

#[tokio::test(flavor = "multi_thread")]
async fn svg_is_reoptimized_every_time() {
    let dir = TempDir::new().unwrap();
    let source = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\">{}<rect width=\"1\" height=\"1\"/></svg>",
        " ".repeat(2_000)
    );
    let input = write(&dir, "logo.svg", source.as_bytes());
    let codec = SizedCodec::new(0);
    let minifier = minifier(MinifyConfig::default(), codec.clone());

    assert!(minifier.minify(&input).await.unwrap().is_written());
    // nothing left to gain, but the optimizer still ran
    let second = minifier.minify(&input).await.unwrap();
    assert!(matches!(second, MinifyOutcome::BelowThreshold { .. }));
    assert_eq!(codec.svg_calls(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn buffers_are_returned_not_written() {
    let dir = TempDir::new().unwrap();
    let minifier = minifier(MinifyConfig::default(), SizedCodec::new(40_000));

    let outcome = minifier
        .minify(&ImageInput::Buffer(jpeg_fixture(50_000)))
        .await
        .unwrap();
    let MinifyOutcome::Minified { buffer, .. } = outcome else {
        panic!("expected Minified, got {outcome:?}");
    };
    assert_eq!(buffer.map(|b| b.len()), Some(40_000));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_file_is_fatal_without_silent_errors() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "notes.txt", b"shopping list");
    let minifier = minifier(MinifyConfig::default(), SizedCodec::new(10));

    let err = minifier.minify(&input).await.unwrap_err();
    match err {
        OptimizerError::Fatal { identifier, message } => {
            assert!(identifier.ends_with("notes.txt"));
            assert!(message.contains("unsupported file type 'txt'"));
        }
        other => panic!("expected Fatal, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_file_fails_quietly_with_silent_errors() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "notes.txt", b"shopping list");
    let config = MinifyConfig {
        silent_errors: true,
        ..MinifyConfig::default()
    };
    let minifier = minifier(config, SizedCodec::new(10));

    let outcome = minifier.minify(&input).await.unwrap();
    assert!(matches!(outcome, MinifyOutcome::Failed { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let minifier = minifier(MinifyConfig::default(), SizedCodec::new(10));
    let err = minifier
        .minify(&ImageInput::Path(dir.path().join("gone.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizerError::Io { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_isolates_errors_when_silent() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![
        write(&dir, "a.jpg", &jpeg_fixture(50_000)),
        write(&dir, "notes.txt", b"not an image"),
        write(&dir, "b.jpg", &jpeg_fixture(60_000)),
    ];
    let config = MinifyConfig {
        silent_errors: true,
        ..MinifyConfig::default()
    };
    let minifier = minifier(config, SizedCodec::new(40_000));

    let results = minifier.run_all(&inputs).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().map(|s| s.saved.count), Some(10_000));
    assert!(results[1].is_none());
    assert_eq!(results[2].as_ref().map(|s| s.saved.count), Some(20_000));
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_stops_on_first_fatal_error() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![
        write(&dir, "a.jpg", &jpeg_fixture(50_000)),
        write(&dir, "notes.txt", b"not an image"),
    ];
    let minifier = minifier(MinifyConfig::default(), SizedCodec::new(40_000));

    let err = minifier.run_all(&inputs).await.unwrap_err();
    assert!(matches!(err, OptimizerError::Fatal { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn clones_share_one_pool() {
    let minifier = minifier(MinifyConfig::default(), Arc::new(image_lint_staged::NativeCodec));
    let clone = minifier.clone();
    assert!(Arc::ptr_eq(minifier.pool(), clone.pool()));
}

#[tokio::test(flavor = "multi_thread")]
async fn huge_skip_delta_rejects_everything() {
    let dir = TempDir::new().unwrap();
    let original = jpeg_fixture(50_000);
    let input = write(&dir, "photo.jpg", &original);
    let config = MinifyConfig {
        skip_delta: u64::MAX,
        ..MinifyConfig::default()
    };
    let minifier = minifier(config, SizedCodec::new(40_000));

    let outcome = minifier.minify(&input).await.unwrap();
    assert!(matches!(outcome, MinifyOutcome::BelowThreshold { .. }), "{outcome:?}");
    assert_eq!(read(&input), original);
}
