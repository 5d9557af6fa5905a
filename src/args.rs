use clap::Parser;
use std::path::PathBuf;

/// Downloads a file over HTTP by fetching fixed-size byte ranges in parallel
/// and stitching them back together in order.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The URL of the file to download.
    pub url: String,

    /// Number of segments fetched concurrently. Negative values use the default (10).
    #[arg(short = 't', long, allow_negative_numbers = true)]
    pub threads: Option<i64>,

    /// Segment length in bytes. Negative values use the default (1024).
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub segment_length: Option<i64>,

    /// Directory to write the file into. Defaults to the current directory.
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Table mapping content types to file extensions (`'ext' => 'mime/type',` per line).
    #[arg(long, default_value = "./mime")]
    pub mime_table: PathBuf,

    /// Connect and read-idle timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Print the run summary as JSON on success.
    #[arg(long)]
    pub json: bool,

    /// Show debug output. Overridden by RUST_LOG.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
}
