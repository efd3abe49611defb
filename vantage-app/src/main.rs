//! Vantage
//!
//! A viewer for PLY point clouds and meshes. Models load from local
//! disk, a URL, or the bundled sample, and are shown with orbit/pan/zoom
//! controls.

mod app;
mod fetch;
mod panel;
mod session;
mod source;
mod viewer;

use clap::Parser;
use std::path::PathBuf;

/// Vantage - PLY Model Viewer
#[derive(Parser, Debug)]
#[command(name = "vantage")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a PLY file to load at startup
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// URL of a PLY file to load at startup
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Seconds before an in-flight load is declared timed out
    #[arg(long, default_value_t = session::DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Disable the load timeout entirely
    #[arg(long)]
    no_timeout: bool,
}

fn main() {
    // Note: tracing is initialized by vantage-window's run_with_delegate.

    let args = Args::parse();

    if let Err(e) = app::run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
