//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Loopback media server for an embedded browser view
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: mediasrv.toml)
    #[arg(short = 'C', long, default_value = "mediasrv.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Port number to listen on (0 = any free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory served for plain requests
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub web_root: Option<PathBuf>,

    /// Export folder served under /_anki/
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub export_dir: Option<PathBuf>,

    /// Enable developer diagnostics
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
