//! Command line surface of `proxykit`.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// proxykit - FoxyProxy configurations and per-container proxy personas
#[derive(Parser, Debug)]
#[command(name = "proxykit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file (default: ./proxykit.yaml when present)
    #[arg(long, short = 'c', global = true, env = "PROXYKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror debug logs to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Run as if the host had no container support
    #[arg(long, global = true)]
    pub no_containers: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store, show or clear account credentials
    #[command(subcommand)]
    Credentials(CredentialsCmd),

    /// Generate a new proxy configuration document
    Generate(GenerateArgs),

    /// Write the current document to a timestamped JSON file
    Export(ExportArgs),

    /// Manage containers
    #[command(subcommand)]
    Containers(ContainersCmd),

    /// Detect the public IP and location of every container
    Ips(IpsArgs),

    /// Send a raw JSON message to the background process
    #[command(after_help = "EXAMPLES:
    proxykit message '{\"action\":\"getConfig\"}'
    proxykit message '{\"action\":\"getContainerInfo\",\"cookieStoreId\":\"firefox-container-1\"}'
")]
    Message {
        /// JSON object with an `action` field
        json: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CredentialsCmd {
    /// Save username and password
    Set {
        #[arg(long, short = 'u')]
        username: String,
        #[arg(long, short = 'p')]
        password: String,
    },
    /// Show whether credentials are stored
    Show,
    /// Remove stored credentials
    Clear,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Number of proxies (overrides the stored setting)
    #[arg(long, short = 'n')]
    pub count: Option<u32>,

    /// Region code such as US or DE (overrides the stored setting)
    #[arg(long, short = 'r')]
    pub region: Option<String>,

    /// Print the document to stdout
    #[arg(long)]
    pub print: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory
    #[arg(long, short = 'd', default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ContainersCmd {
    /// List containers
    List,
    /// Create a container and open the IP check page in it
    Create {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete one container
    Remove { id: String },
    /// Delete every container
    RemoveAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Open a new tab in a container
    Open {
        id: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// Activate a container's first tab, opening one if it has none
    Switch {
        id: String,
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct IpsArgs {
    /// Keep refreshing on the configured interval
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Stop watching after this many completed refreshes
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Refresh only this container
    #[arg(long, conflicts_with_all = ["watch", "ticks"])]
    pub id: Option<String>,
}
