//! Size delta between an original and a re-encoded image.

use serde::Serialize;

const UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// A byte count together with its human-readable rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteSize {
    pub count: i64,
    pub display: String,
}

impl ByteSize {
    pub fn new(count: i64) -> Self {
        Self {
            count,
            display: pretty_bytes(count),
        }
    }
}

/// Original size, optimized size and the difference between them.
///
/// `saved` is negative when the optimized image is larger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    pub original_size: ByteSize,
    pub optimized_size: ByteSize,
    pub saved: ByteSize,
}

impl Savings {
    pub fn is_regression(&self) -> bool {
        self.optimized_size.count > self.original_size.count
    }
}

/// Compares two buffers by length.
pub fn compute_savings(original: &[u8], optimized: &[u8]) -> Savings {
    let original_size = original.len() as i64;
    let optimized_size = optimized.len() as i64;

    Savings {
        original_size: ByteSize::new(original_size),
        optimized_size: ByteSize::new(optimized_size),
        saved: ByteSize::new(original_size - optimized_size),
    }
}

/// Renders a byte count with decimal units and three significant digits.
///
/// `1337 -> "1.34 kB"`, `10000 -> "10 kB"`, `-100 -> "-100 B"`.
pub fn pretty_bytes(count: i64) -> String {
    let sign = if count < 0 { "-" } else { "" };
    let magnitude = count.unsigned_abs() as f64;

    if magnitude < 1000.0 {
        return format!("{sign}{} B", count.unsigned_abs());
    }

    // the unit is picked before rounding, so 999_999 reads "1000 kB"
    let exponent = ((magnitude.log10() / 3.0).floor() as usize).min(UNITS.len() - 1);
    let value = magnitude / 1000f64.powi(exponent as i32);

    format!("{sign}{} {}", trim_number(round_significant(value)), UNITS[exponent])
}

fn round_significant(value: f64) -> f64 {
    let digits = if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

fn trim_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
