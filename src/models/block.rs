use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_with::hex::Hex;
use serde_with::serde_as;

use super::{BalanceUpdate, Operation};
use crate::decode::{Discriminated, Registry, VariantFamily, deserialize_sequence, deserialize_variant};

/// A block as returned by `/chains/<chain>/blocks/<block>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    pub protocol: String,
    pub chain_id: String,
    pub hash: String,
    pub header: RawBlockHeader,
    pub metadata: BlockHeaderMetadata,
    /// One list per validation pass.
    #[serde(default)]
    pub operations: Vec<Vec<Operation>>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawBlockHeader {
    pub level: i32,
    pub proto: u8,
    pub predecessor: String,
    pub timestamp: DateTime<Utc>,
    pub validation_pass: u8,
    pub operations_hash: String,
    #[serde_as(as = "Vec<Hex>")]
    pub fitness: Vec<Vec<u8>>,
    pub context: String,
    #[serde(default)]
    pub priority: i16,
    #[serde_as(as = "Hex")]
    pub proof_of_work_nonce: Vec<u8>,
    pub seed_nonce_hash: Option<String>,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockHeaderMetadata {
    pub protocol: String,
    pub next_protocol: String,
    pub test_chain_status: TestChainStatus,
    pub max_operations_ttl: i32,
    pub max_operation_data_length: i32,
    pub max_block_header_length: i32,
    #[serde(default)]
    pub max_operation_list_length: Vec<MaxOperationListLength>,
    pub baker: String,
    pub level: LevelInfo,
    pub voting_period_kind: String,
    pub nonce_hash: Option<String>,
    pub consumed_gas: String,
    #[serde(default)]
    pub deactivated: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_sequence")]
    pub balance_updates: Vec<BalanceUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaxOperationListLength {
    pub max_size: i32,
    pub max_op: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelInfo {
    pub level: i32,
    pub level_position: i32,
    pub cycle: i32,
    pub cycle_position: i32,
    pub voting_period: i32,
    pub voting_period_position: i32,
    pub expected_commitment: bool,
}

/// State of the test chain, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestChainStatus {
    NotRunning,
    Forking(ForkingTestChainStatus),
    Running(RunningTestChainStatus),
    Generic(GenericTestChainStatus),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericTestChainStatus {
    pub status: String,
}

#[derive(Deserialize)]
struct NotRunningTestChainStatus {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForkingTestChainStatus {
    pub protocol: String,
    pub expiration: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunningTestChainStatus {
    pub chain_id: String,
    pub genesis: String,
    pub protocol: String,
    pub expiration: DateTime<Utc>,
}

impl Discriminated for TestChainStatus {
    fn discriminator(&self) -> &str {
        match self {
            TestChainStatus::NotRunning => "not_running",
            TestChainStatus::Forking(_) => "forking",
            TestChainStatus::Running(_) => "running",
            TestChainStatus::Generic(status) => status.status.as_str(),
        }
    }
}

static TEST_CHAIN_STATUS: LazyLock<Registry<TestChainStatus>> = LazyLock::new(|| {
    Registry::builder("test chain status", "status", |status| {
        TestChainStatus::Generic(GenericTestChainStatus { status })
    })
    .register("not_running", |_: NotRunningTestChainStatus| TestChainStatus::NotRunning)
    .register("forking", TestChainStatus::Forking)
    .register("running", TestChainStatus::Running)
    .build()
});

impl VariantFamily for TestChainStatus {
    fn registry() -> &'static Registry<Self> {
        &TEST_CHAIN_STATUS
    }
}

impl<'de> Deserialize<'de> for TestChainStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_variant(deserializer)
    }
}
