use std::path::PathBuf;

use clap::Parser;
use image_lint_staged::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(name = "image-lint-staged")]
#[command(about = "Minify staged images in place")]
#[command(version)]
pub struct Cli {
    /// Image files to minify
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[arg(short, long, help = "Config file to use instead of searching for one")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Minimum byte reduction required to rewrite a file")]
    pub skip_delta: Option<u64>,

    #[arg(long, help = "Report encode errors and keep going instead of failing")]
    pub silent_errors: bool,

    #[arg(long, help = "Do not print a savings line per file")]
    pub no_savings: bool,

    #[arg(short, long, help = "Number of encode workers (default: CPUs - 1)")]
    pub jobs: Option<usize>,

    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,
}

impl Cli {
    /// Flags that were actually given; unset flags leave config values alone.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            skip_delta: self.skip_delta,
            silent_errors: self.silent_errors.then_some(true),
            show_savings: self.no_savings.then_some(false),
        }
    }
}
