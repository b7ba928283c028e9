//! Client configuration.
//!
//! Settings are read from a TOML file, created with defaults on first use,
//! and layered with `TEZOS_RPC__*` environment variables.

mod loader;

use serde::{Deserialize, Serialize};

pub use loader::{get_default_config, load_client_config, write_config_to};

/// Settings for [`RpcClient`](crate::http::RpcClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// RPC endpoint of the node, e.g. `http://localhost:8732`.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Retries for transient transport failures. 0 disables retrying.
    pub max_retries: u32,
    /// Overrides the `tezos-rpc/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8732".to_string(),
            timeout_secs: 30,
            max_retries: 0,
            user_agent: None,
        }
    }
}
