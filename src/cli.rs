use clap::Parser;
use std::path::PathBuf;

/// Sprite sheet compositor
///
/// All arguments only prefill the window; composition always runs through
/// the interactive UI.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing the numbered frame images
    #[arg(value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Output sheet path (format from extension: png, jpg, bmp, ...)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Grid columns (default 10)
    #[arg(long = "columns", value_name = "N")]
    pub columns: Option<u32>,

    /// Grid rows (default 1)
    #[arg(long = "rows", value_name = "N")]
    pub rows: Option<u32>,

    /// Downscale the final sheet to a single frame's size
    #[arg(long = "downscale")]
    pub downscale: bool,

    /// Enable debug logging to file (default: spritegrid.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
