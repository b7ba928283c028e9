//! Operations and the two variant families they contain: operation contents
//! (tagged by `kind`) and balance updates (also tagged by `kind`).

use std::sync::LazyLock;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_json::value::RawValue;
use serde_with::{DisplayFromStr, serde_as};

use super::ProtocolError;
use crate::decode::{Discriminated, Registry, VariantFamily, deserialize_sequence, deserialize_tuple, deserialize_variant};

/// One element of an operation's `contents`.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationElem {
    Endorsement(EndorsementOperationElem),
    Transaction(TransactionOperationElem),
    /// Any kind without a dedicated type; only the kind is kept.
    Generic(GenericOperationElem),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericOperationElem {
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndorsementOperationElem {
    pub level: i32,
    pub metadata: Option<EndorsementOperationMetadata>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndorsementOperationMetadata {
    #[serde(default, deserialize_with = "deserialize_sequence")]
    pub balance_updates: Vec<BalanceUpdate>,
    pub delegate: String,
    #[serde(default)]
    pub slots: Vec<u16>,
}

/// A transfer between two contracts. Amounts are in mutez.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionOperationElem {
    pub source: String,
    #[serde_as(as = "DisplayFromStr")]
    pub fee: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub counter: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub storage_limit: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u64,
    pub destination: String,
    pub parameters: Option<Value>,
    pub metadata: Option<TransactionOperationMetadata>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionOperationMetadata {
    #[serde(default, deserialize_with = "deserialize_sequence")]
    pub balance_updates: Vec<BalanceUpdate>,
    pub operation_result: Option<Value>,
}

impl Discriminated for OperationElem {
    fn discriminator(&self) -> &str {
        match self {
            OperationElem::Endorsement(_) => "endorsement",
            OperationElem::Transaction(_) => "transaction",
            OperationElem::Generic(elem) => elem.kind.as_str(),
        }
    }
}

static OPERATION_ELEMENTS: LazyLock<Registry<OperationElem>> = LazyLock::new(|| {
    Registry::builder("operation element", "kind", |kind| {
        OperationElem::Generic(GenericOperationElem { kind })
    })
    .register("endorsement", OperationElem::Endorsement)
    .register("transaction", OperationElem::Transaction)
    .build()
});

impl VariantFamily for OperationElem {
    fn registry() -> &'static Registry<Self> {
        &OPERATION_ELEMENTS
    }
}

impl<'de> Deserialize<'de> for OperationElem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_variant(deserializer)
    }
}

/// A balance change caused by an operation or by block application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceUpdate {
    Contract(ContractBalanceUpdate),
    Freezer(FreezerBalanceUpdate),
    Generic(GenericBalanceUpdate),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericBalanceUpdate {
    pub kind: String,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractBalanceUpdate {
    pub contract: String,
    #[serde_as(as = "DisplayFromStr")]
    pub change: i64,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FreezerBalanceUpdate {
    pub category: String,
    pub delegate: String,
    pub level: i32,
    #[serde_as(as = "DisplayFromStr")]
    pub change: i64,
}

impl BalanceUpdate {
    /// The signed change in mutez, when the update kind carries one this
    /// client understands.
    pub fn change(&self) -> Option<i64> {
        match self {
            BalanceUpdate::Contract(update) => Some(update.change),
            BalanceUpdate::Freezer(update) => Some(update.change),
            BalanceUpdate::Generic(_) => None,
        }
    }
}

impl Discriminated for BalanceUpdate {
    fn discriminator(&self) -> &str {
        match self {
            BalanceUpdate::Contract(_) => "contract",
            BalanceUpdate::Freezer(_) => "freezer",
            BalanceUpdate::Generic(update) => update.kind.as_str(),
        }
    }
}

static BALANCE_UPDATES: LazyLock<Registry<BalanceUpdate>> = LazyLock::new(|| {
    Registry::builder("balance update", "kind", |kind| {
        BalanceUpdate::Generic(GenericBalanceUpdate { kind })
    })
    .register("contract", BalanceUpdate::Contract)
    .register("freezer", BalanceUpdate::Freezer)
    .build()
});

impl VariantFamily for BalanceUpdate {
    fn registry() -> &'static Registry<Self> {
        &BALANCE_UPDATES
    }
}

impl<'de> Deserialize<'de> for BalanceUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_variant(deserializer)
    }
}

/// An operation as included in a block or listed by the mempool.
///
/// `protocol` and `chain_id` are absent from mempool listings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Operation {
    pub protocol: String,
    pub chain_id: String,
    pub hash: String,
    pub branch: String,
    #[serde(deserialize_with = "deserialize_sequence")]
    pub contents: Vec<OperationElem>,
    pub signature: Option<String>,
}

/// An [`Operation`] encoded as `[hash, operation]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationAlt(pub Operation);

impl<'de> Deserialize<'de> for OperationAlt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (hash, mut operation): (String, Operation) = deserialize_tuple(deserializer)?;
        operation.hash = hash;
        Ok(Self(operation))
    }
}

/// An operation the node refused, with the reasons it gave.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationWithError {
    pub operation: Operation,
    pub error: Vec<ProtocolError>,
}

#[derive(Deserialize)]
struct ErrorField {
    #[serde(default)]
    error: Vec<ProtocolError>,
}

impl<'de> Deserialize<'de> for OperationWithError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The operation fields and `error` share one object; decode it twice
        // rather than flattening, which would buffer away the raw fragments
        // the variant decoders rely on.
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let operation: Operation = serde_json::from_str(raw.get()).map_err(serde::de::Error::custom)?;
        let ErrorField { error } = serde_json::from_str(raw.get()).map_err(serde::de::Error::custom)?;
        Ok(Self { operation, error })
    }
}

/// An [`OperationWithError`] encoded as `[hash, operation]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationWithErrorAlt(pub OperationWithError);

impl<'de> Deserialize<'de> for OperationWithErrorAlt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (hash, mut refused): (String, OperationWithError) = deserialize_tuple(deserializer)?;
        refused.operation.hash = hash;
        Ok(Self(refused))
    }
}

/// Contents of `/chains/<chain>/mempool/pending_operations`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MempoolPendingOperations {
    pub applied: Vec<Operation>,
    pub refused: Vec<OperationWithErrorAlt>,
    pub branch_refused: Vec<OperationWithErrorAlt>,
    pub branch_delayed: Vec<OperationWithErrorAlt>,
    pub unprocessed: Vec<OperationAlt>,
}
