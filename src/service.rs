//! Typed access to the node's network, balance, chain and monitoring RPCs.
//!
//! # Example
//!
//! ```rust,no_run
//! use tezos_rpc::Service;
//! use tezos_rpc::http::RpcClient;
//! use url::Url;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let service = Service::new(RpcClient::new(Url::parse("http://localhost:8732")?)?);
//!
//! let stats = service.get_network_stats().await?;
//! println!("sent {} bytes", stats.total_bytes_sent);
//!
//! let block = service.get_block("main", "head").await?;
//! println!("head is at level {}", block.header.level);
//! # Ok(())
//! # }
//! ```

use log::debug;
use reqwest::{Method, Request};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_with::{DisplayFromStr, serde_as};
use tokio_util::sync::CancellationToken;

use crate::http::{JsonStream, RpcClient, RpcError};
use crate::models::{
    Block, BootstrappedBlock, MempoolPendingOperations, NetworkConnection, NetworkPeer, NetworkPeerLogEntry,
    NetworkPeerWithId, NetworkStats,
};

/// A balance in mutez, sent by the node as a decimal string.
#[serde_as]
#[derive(Deserialize)]
struct Mutez(#[serde_as(as = "DisplayFromStr")] u64);

pub struct Service {
    client: RpcClient,
}

impl Service {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    fn request(&self, path: &str) -> Result<Request, RpcError> {
        self.client.new_request(Method::GET, path, None::<&()>)
    }

    /// `GET /network/stat`
    pub async fn get_network_stats(&self) -> Result<NetworkStats, RpcError> {
        self.client.get(self.request("/network/stat")?).await
    }

    /// `GET /network/connections`
    pub async fn get_network_connections(&self) -> Result<Vec<NetworkConnection>, RpcError> {
        self.client.get(self.request("/network/connections")?).await
    }

    /// `GET /network/peers`, optionally restricted to peers in the given
    /// state (`accepted`, `running` or `disconnected`).
    pub async fn get_network_peers(&self, filter: Option<&str>) -> Result<Vec<NetworkPeer>, RpcError> {
        let path = match filter.filter(|f| !f.is_empty()) {
            Some(filter) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("filter", filter)
                    .finish();
                format!("/network/peers?{query}")
            },
            None => "/network/peers".to_string(),
        };

        let peers: Vec<NetworkPeerWithId> = self.client.get(self.request(&path)?).await?;
        debug!(count = peers.len(); "Fetched network peers");
        Ok(peers.into_iter().map(|NetworkPeerWithId(peer)| peer).collect())
    }

    /// `GET /network/peers/<peer_id>`
    pub async fn get_network_peer(&self, peer_id: &str) -> Result<NetworkPeer, RpcError> {
        let mut peer: NetworkPeer = self.client.get(self.request(&format!("/network/peers/{peer_id}"))?).await?;
        peer.peer_id = peer_id.to_string();
        Ok(peer)
    }

    /// `GET /network/peers/<peer_id>/ban`
    pub async fn ban_network_peer(&self, peer_id: &str) -> Result<(), RpcError> {
        let _: IgnoredAny = self
            .client
            .get(self.request(&format!("/network/peers/{peer_id}/ban"))?)
            .await?;
        Ok(())
    }

    /// `GET /network/peers/<peer_id>/trust`
    pub async fn trust_network_peer(&self, peer_id: &str) -> Result<(), RpcError> {
        let _: IgnoredAny = self
            .client
            .get(self.request(&format!("/network/peers/{peer_id}/trust"))?)
            .await?;
        Ok(())
    }

    /// `GET /network/peers/<peer_id>/banned`
    pub async fn get_network_peer_banned(&self, peer_id: &str) -> Result<bool, RpcError> {
        self.client
            .get(self.request(&format!("/network/peers/{peer_id}/banned"))?)
            .await
    }

    /// `GET /network/peers/<peer_id>/log`
    pub async fn get_network_peer_log(&self, peer_id: &str) -> Result<Vec<NetworkPeerLogEntry>, RpcError> {
        self.client
            .get(self.request(&format!("/network/peers/{peer_id}/log"))?)
            .await
    }

    /// `GET /network/peers/<peer_id>/log?monitor`
    ///
    /// Each stream item is one batch of log entries as the node emits them.
    pub async fn monitor_network_peer_log(
        &self,
        peer_id: &str,
        cancel: CancellationToken,
    ) -> Result<JsonStream<Vec<NetworkPeerLogEntry>>, RpcError> {
        let request = self.request(&format!("/network/peers/{peer_id}/log?monitor"))?;
        self.client.stream(request, cancel).await
    }

    /// `GET /chains/<chain>/blocks/<block>/context/delegates/<pkh>/balance`
    pub async fn get_delegate_balance(&self, chain_id: &str, block_id: &str, pkh: &str) -> Result<u64, RpcError> {
        let path = format!("/chains/{chain_id}/blocks/{block_id}/context/delegates/{pkh}/balance");
        let Mutez(balance) = self.client.get(self.request(&path)?).await?;
        Ok(balance)
    }

    /// `GET /chains/<chain>/blocks/<block>/context/contracts/<contract>/balance`
    pub async fn get_contract_balance(
        &self,
        chain_id: &str,
        block_id: &str,
        contract_id: &str,
    ) -> Result<u64, RpcError> {
        let path = format!("/chains/{chain_id}/blocks/{block_id}/context/contracts/{contract_id}/balance");
        let Mutez(balance) = self.client.get(self.request(&path)?).await?;
        Ok(balance)
    }

    /// `GET /chains/<chain>/blocks/<block>`
    pub async fn get_block(&self, chain_id: &str, block_id: &str) -> Result<Block, RpcError> {
        self.client
            .get(self.request(&format!("/chains/{chain_id}/blocks/{block_id}"))?)
            .await
    }

    /// `GET /chains/<chain>/mempool/pending_operations`
    pub async fn get_mempool_pending_operations(&self, chain_id: &str) -> Result<MempoolPendingOperations, RpcError> {
        self.client
            .get(self.request(&format!("/chains/{chain_id}/mempool/pending_operations"))?)
            .await
    }

    /// `GET /monitor/bootstrapped`
    pub async fn get_bootstrapped(&self, cancel: CancellationToken) -> Result<JsonStream<BootstrappedBlock>, RpcError> {
        self.client.stream(self.request("/monitor/bootstrapped")?, cancel).await
    }
}
