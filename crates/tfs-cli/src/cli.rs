use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tfs_sdk::FileKind;

#[derive(Parser)]
#[command(
    name = "tfs",
    about = "TenantFS: sandboxed multi-tenant file and content store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store configuration file (TOML)
    #[arg(short, long, global = true, default_value = "tfs.toml")]
    pub config: PathBuf,

    /// Tenant to operate on (required by tenant commands)
    #[arg(short, long, global = true)]
    pub tenant: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file in the shared content-addressed store
    Put(PutArgs),
    /// Fetch a content object by digest
    Get(GetArgs),
    /// List content objects, newest first
    Objects,
    /// Remove staging files left behind by interrupted writes
    Sweep(SweepArgs),
    /// Upload a local file into the tenant tree
    Upload(UploadArgs),
    /// Download a tenant file or content object (`cid:<hex>`)
    Download(DownloadArgs),
    /// Show the directory tree
    Ls(LsArgs),
    /// Create a directory
    Mkdir(PathArgs),
    /// Delete a file or directory tree
    Rm(PathArgs),
    /// Rename an entry within its directory
    Rename(RenameArgs),
    /// Move an entry to a new path
    Mv(TransferArgs),
    /// Copy a file or directory tree
    Cp(TransferArgs),
    /// Print a text file
    Cat(PathArgs),
    /// Replace the contents of an existing text file
    Write(WriteArgs),
    /// Most recently modified files
    Recent(RecentArgs),
    /// Issue a share token for a tenant file or content object
    Share(ShareArgs),
    /// Redeem a share token and download its target
    Redeem(RedeemArgs),
}

#[derive(Args)]
pub struct PutArgs {
    /// Local file to store
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    /// Hex SHA-256 digest
    pub cid: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct SweepArgs {
    /// Only remove staging files older than this many seconds
    #[arg(long, default_value = "3600")]
    pub min_age: u64,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Local file to upload
    pub file: PathBuf,
    /// Destination path; defaults to the local file name at the root
    pub dest: Option<String>,
}

#[derive(Args)]
pub struct DownloadArgs {
    /// Virtual path, or `cid:<hex>`
    pub locator: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = "")]
    pub path: String,
    /// Limit the listing to this many levels
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct RenameArgs {
    pub path: String,
    pub new_name: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub src: String,
    pub dst: String,
}

#[derive(Args)]
pub struct WriteArgs {
    pub path: String,
    /// Local file holding the new contents
    #[arg(long)]
    pub from: PathBuf,
}

#[derive(Args)]
pub struct RecentArgs {
    /// Only files of this kind (text, image, video, audio, binary)
    #[arg(short, long)]
    pub kind: Option<FileKind>,
    #[arg(long, default_value = "1")]
    pub page: usize,
    #[arg(long, default_value = "5")]
    pub per_page: usize,
}

#[derive(Args)]
pub struct ShareArgs {
    /// Virtual path, or `cid:<hex>`
    pub target: String,
    /// Token lifetime in seconds; defaults to the configured lifetime
    #[arg(long)]
    pub ttl: Option<u64>,
}

#[derive(Args)]
pub struct RedeemArgs {
    pub token: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
