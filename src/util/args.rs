use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// path to the TOML configuration file
    #[arg(short, long, default_value = "csloadout.toml")]
    pub config: PathBuf,
    /// directory holding the catalog data files
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,
    /// address to listen on for session-host events
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    pub listen: String,
}
