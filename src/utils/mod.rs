pub mod error;
pub mod formats;
pub mod fs;
pub mod savings;

pub use error::{OptimizerError, OptimizerResult};
pub use formats::{ImageFormat, extension_of, format_from_extension};
pub use fs::{read_file, read_file_blocking, write_file};
pub use savings::{ByteSize, Savings, compute_savings, pretty_bytes};
