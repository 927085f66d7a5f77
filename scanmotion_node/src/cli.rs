use clap::Parser;
use std::path::PathBuf;

/// scanmotion: detects moving objects in planar lidar scans.
///
/// Runs the simulated scanner unless `--replay` points at a recording.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The node configuration TOML file. A missing file means defaults.
    #[arg(short, long, default_value = "config/scanmotion.toml")]
    pub config: PathBuf,

    /// A JSON-lines recording, or a directory of `*.jsonl` recordings.
    #[arg(short, long)]
    pub replay: Option<PathBuf>,

    /// Write reports as JSON lines to this file (`-` for stdout).
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Stop after this many batches.
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Number of simulated sensors; overrides `simulation.sensors`.
    #[arg(long)]
    pub streams: Option<usize>,

    /// Print the merged configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}
