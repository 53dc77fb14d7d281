use clap::Parser;

/// Input and output paths are fixed; see `core::config`.
#[derive(Parser)]
#[command(
    name = "pulse-report",
    version,
    about = "Static HTML report for a Likert-scale pulse survey export (reads numbers.csv)"
)]
pub struct Cli {
    /// Log every pipeline stage and data-quality note to stderr.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
