use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_with::{DisplayFromStr, serde_as};

use crate::decode::deserialize_tuple;

/// Global network bandwidth totals and current usage in B/s.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkStats {
    #[serde(rename = "total_sent")]
    #[serde_as(as = "DisplayFromStr")]
    pub total_bytes_sent: i64,
    #[serde(rename = "total_recv")]
    #[serde_as(as = "DisplayFromStr")]
    pub total_bytes_recv: i64,
    pub current_inflow: i64,
    pub current_outflow: i64,
}

/// Detailed information about one open connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConnection {
    pub incoming: bool,
    pub peer_id: String,
    pub id_point: NetworkAddress,
    pub remote_socket_port: u16,
    pub versions: Vec<NetworkVersion>,
    pub private: bool,
    pub local_metadata: NetworkMetadata,
    pub remote_metadata: NetworkMetadata,
}

/// A point's address and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct NetworkAddress {
    pub addr: String,
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkVersion {
    pub name: String,
    pub major: u16,
    pub minor: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkMetadata {
    pub disable_mempool: bool,
    pub private_node: bool,
}

/// One message of the `/monitor/bootstrapped` stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BootstrappedBlock {
    pub block: String,
    pub timestamp: DateTime<Utc>,
}

/// A peer address paired with the time of an event, encoded on the wire as
/// `[{"addr": ..., "port": ...}, "timestamp"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConnectionTime {
    pub address: NetworkAddress,
    pub time: DateTime<Utc>,
}

impl<'de> Deserialize<'de> for NetworkConnectionTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (address, time) = deserialize_tuple(deserializer)?;
        Ok(Self { address, time })
    }
}

/// Information about a known peer.
///
/// `peer_id` is not part of the peer object itself. It is filled from the
/// request path or from the `[peer_id, peer]` pair of a peer listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkPeer {
    #[serde(skip)]
    pub peer_id: String,
    pub score: f64,
    pub trusted: bool,
    pub conn_metadata: Option<NetworkMetadata>,
    pub state: String,
    pub reachable_at: Option<NetworkAddress>,
    pub stat: NetworkStats,
    pub last_established_connection: Option<NetworkConnectionTime>,
    pub last_seen: Option<NetworkConnectionTime>,
    pub last_failed_connection: Option<NetworkConnectionTime>,
    pub last_rejected_connection: Option<NetworkConnectionTime>,
    pub last_disconnection: Option<NetworkConnectionTime>,
    pub last_miss: Option<NetworkConnectionTime>,
}

/// Element of a peer listing: `[peer_id, peer]`.
pub(crate) struct NetworkPeerWithId(pub NetworkPeer);

impl<'de> Deserialize<'de> for NetworkPeerWithId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (peer_id, mut peer): (String, NetworkPeer) = deserialize_tuple(deserializer)?;
        peer.peer_id = peer_id;
        Ok(Self(peer))
    }
}

/// One entry of a peer's connection log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkPeerLogEntry {
    #[serde(flatten)]
    pub address: NetworkAddress,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}
