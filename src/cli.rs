//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use session_jar_core::SortField;
use url::Url;

/// Inspect and manage per-account persisted HTTP cookies.
///
/// Each account's cookies live in their own directory under the storage
/// root, partitioned by domain, one file per cookie.
#[derive(Parser, Debug)]
#[command(name = "session-jar")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Storage root (overrides config file and SESSION_JAR_DIR)
    #[arg(long, value_name = "PATH", global = true)]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the namespace directory of an account
    Path(AccountArgs),
    /// List the live cookies of an account
    List(ListArgs),
    /// Store one cookie
    Set(SetArgs),
    /// Delete a cookie by name and domain
    Delete(DeleteArgs),
    /// Delete cookies stored after a point in time
    PurgeSince(PurgeSinceArgs),
    /// Delete cookies of every account under the storage root
    Clear(ClearArgs),
    /// GET a URL with the account's cookies and persist the response cookies
    Fetch(FetchArgs),
    /// Show the effective configuration
    Config,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AccountArgs {
    /// Account identifier (e.g. an email address)
    #[arg(short, long)]
    pub account: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Only cookies of the partition for this URL's host
    #[arg(long)]
    pub url: Option<Url>,

    /// Sort keys, most significant first
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [SortKey::Domain, SortKey::Name])]
    pub sort: Vec<SortKey>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Print cookie values instead of redacting them
    #[arg(long)]
    pub show_values: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SetArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub value: String,

    #[arg(long)]
    pub domain: String,

    #[arg(long, default_value = "/")]
    pub path: String,

    /// Lifetime in seconds; omit for a session cookie
    #[arg(long, value_name = "SECS")]
    pub expires_in: Option<u64>,

    #[arg(long)]
    pub secure: bool,

    #[arg(long)]
    pub http_only: bool,

    /// Partition by this URL's host instead of the cookie domain
    #[arg(long)]
    pub url: Option<Url>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub domain: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PurgeSinceArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Cutoff in Unix epoch milliseconds; later files are deleted
    #[arg(long, value_name = "MILLIS")]
    pub since_ms: u64,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClearArgs {
    /// Also delete protected (device-trust) cookies
    #[arg(long)]
    pub include_protected: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// URL to request
    pub url: Url,
}

/// Sort keys accepted by `list --sort`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Domain,
    Path,
    Expires,
    Value,
}

impl From<SortKey> for SortField {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => Self::Name,
            SortKey::Domain => Self::Domain,
            SortKey::Path => Self::Path,
            SortKey::Expires => Self::Expires,
            SortKey::Value => Self::Value,
        }
    }
}
