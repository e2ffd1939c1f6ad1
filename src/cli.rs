//! Command line interface for the `wiresession` binary.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments for the `wiresession` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wiresession",
    version,
    about = "Length-prefixed echo server built on wiresession sessions"
)]
pub struct Cli {
    /// Configuration file; the format follows the extension.
    #[arg(short, long, default_value = "./conf/default.toml")]
    pub config: PathBuf,

    /// Listen address, overriding `server.addr`.
    #[arg(long)]
    pub addr: Option<String>,
}
