//! Records returned by the node RPC endpoints.

mod block;
mod network;
mod operations;
mod protocol_error;

pub use block::{
    Block, BlockHeaderMetadata, ForkingTestChainStatus, GenericTestChainStatus, LevelInfo, MaxOperationListLength,
    RawBlockHeader, RunningTestChainStatus, TestChainStatus,
};
pub(crate) use network::NetworkPeerWithId;
pub use network::{
    BootstrappedBlock, NetworkAddress, NetworkConnection, NetworkConnectionTime, NetworkMetadata, NetworkPeer,
    NetworkPeerLogEntry, NetworkStats, NetworkVersion,
};
pub use operations::{
    BalanceUpdate, ContractBalanceUpdate, EndorsementOperationElem, EndorsementOperationMetadata, FreezerBalanceUpdate,
    GenericBalanceUpdate, GenericOperationElem, MempoolPendingOperations, Operation, OperationAlt, OperationElem,
    OperationWithError, OperationWithErrorAlt, TransactionOperationElem, TransactionOperationMetadata,
};
pub use protocol_error::{ErrorKind, ProtocolError};
