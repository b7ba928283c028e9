use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tezos-rpc")]
#[command(about = "Query a Tezos node over its RPC interface", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "Path to the configuration file, created with defaults if missing",
        default_value = "data/config.toml"
    )]
    pub config: PathBuf,
    #[arg(short = 'u', long, help = "Node RPC endpoint, overrides the configured base_url")]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show global network bandwidth statistics
    Stats,
    /// List open connections
    Connections,
    /// List known peers
    Peers {
        #[arg(short, long, help = "Only peers in this state: accepted, running or disconnected")]
        filter: Option<String>,
    },
    /// Show one peer
    Peer { peer_id: String },
    /// Show a peer's connection log
    PeerLog {
        peer_id: String,
        #[arg(short, long, help = "Keep printing new entries until interrupted")]
        monitor: bool,
    },
    /// Ban a peer
    Ban { peer_id: String },
    /// Trust a peer
    Trust { peer_id: String },
    /// Check whether a peer is banned
    Banned { peer_id: String },
    /// Show a delegate's balance in mutez
    DelegateBalance {
        pkh: String,
        #[arg(long, default_value = "main")]
        chain: String,
        #[arg(long, default_value = "head")]
        block: String,
    },
    /// Show a contract's balance in mutez
    ContractBalance {
        contract: String,
        #[arg(long, default_value = "main")]
        chain: String,
        #[arg(long, default_value = "head")]
        block: String,
    },
    /// Show a block with its operations
    Block {
        #[arg(default_value = "head")]
        block: String,
        #[arg(long, default_value = "main")]
        chain: String,
    },
    /// List operations in the mempool
    PendingOperations {
        #[arg(long, default_value = "main")]
        chain: String,
    },
    /// Print blocks as the node reports itself bootstrapped, until interrupted
    Bootstrapped,
}
