use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "arkivd",
    about = "Arkiv - on-demand media archiver daemon",
    version
)]
pub struct Args {
    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Directory where completed artifacts are stored (overrides the config file)
    #[arg(short = 'd', long)]
    pub archive_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
