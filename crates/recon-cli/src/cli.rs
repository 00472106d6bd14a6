use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use recon_merge::ConflictPolicy;

#[derive(Parser)]
#[command(
    name = "recon-merge",
    about = "Merge driver for serial-section reconstruction records",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge the other branch's copy of a record into the current one
    Merge(MergeArgs),
    /// Summarize the contours of a record file
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// Record file on the current branch
    pub current: PathBuf,
    /// Record file on the other branch
    pub other: PathBuf,
    /// Common ancestor of both files
    #[arg(long)]
    pub base: Option<PathBuf>,
    /// Where to write the merged record (defaults to the current file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// How to settle conflicts without asking
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,
    /// Ask about each conflict on the terminal
    #[arg(short, long)]
    pub interactive: bool,
    /// Do not delete the other branch's file after merging
    #[arg(long)]
    pub keep_sources: bool,
    /// Merge configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overlap ratio at or below which contours are the same object
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    Escalate,
    PreferA,
    PreferB,
    KeepBoth,
}

impl From<Strategy> for ConflictPolicy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Escalate => ConflictPolicy::Escalate,
            Strategy::PreferA => ConflictPolicy::PreferA,
            Strategy::PreferB => ConflictPolicy::PreferB,
            Strategy::KeepBoth => ConflictPolicy::KeepBoth,
        }
    }
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,
}
