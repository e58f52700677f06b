use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "anyshare",
    about = "anyShare: short-lived file and text sharing",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// List every record in a snapshot
    List(ListArgs),
    /// Show one record from a snapshot
    Show(ShowArgs),
    /// Evict expired records offline and rewrite the snapshot
    Sweep(SweepArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Payload directory, owned by anyShare alone
    #[arg(long)]
    pub storage_root: Option<PathBuf>,
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, default_value = "tmp_file_map.json")]
    pub snapshot: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
    #[arg(long, default_value = "tmp_file_map.json")]
    pub snapshot: PathBuf,
}

#[derive(Args)]
pub struct SweepArgs {
    #[arg(long, default_value = "tmp_file_map.json")]
    pub snapshot: PathBuf,
    #[arg(long, default_value = "tmp")]
    pub storage_root: PathBuf,
}
