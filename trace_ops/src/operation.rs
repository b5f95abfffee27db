//! The ledger view of a transaction.

use std::collections::BTreeSet;

use alloy::primitives::Address;
use num_bigint::BigInt;
use serde::Serialize;

use crate::{Currency, TraceType};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OperationType {
    #[serde(rename = "MINER_REWARD")]
    #[strum(serialize = "MINER_REWARD")]
    MinerReward,
    #[serde(rename = "UNCLE_REWARD")]
    #[strum(serialize = "UNCLE_REWARD")]
    UncleReward,
    Fee,
    Call,
    Create,
    Create2,
    SelfDestruct,
    CallCode,
    DelegateCall,
    StaticCall,
    /// Zeroes what is left on a self-destructed account.
    Destruct,
}

impl OperationType {
    pub const ALL: [OperationType; 11] = [
        OperationType::MinerReward,
        OperationType::UncleReward,
        OperationType::Fee,
        OperationType::Call,
        OperationType::Create,
        OperationType::Create2,
        OperationType::SelfDestruct,
        OperationType::CallCode,
        OperationType::DelegateCall,
        OperationType::StaticCall,
        OperationType::Destruct,
    ];
}

impl From<TraceType> for OperationType {
    fn from(value: TraceType) -> Self {
        match value {
            TraceType::Call => OperationType::Call,
            TraceType::CallCode => OperationType::CallCode,
            TraceType::DelegateCall => OperationType::DelegateCall,
            TraceType::StaticCall => OperationType::StaticCall,
            TraceType::Create => OperationType::Create,
            TraceType::Create2 => OperationType::Create2,
            TraceType::SelfDestruct => OperationType::SelfDestruct,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OperationStatus {
    Success,
    Failure,
}

impl OperationStatus {
    pub const ALL: [OperationStatus; 2] = [OperationStatus::Success, OperationStatus::Failure];

    /// Whether balances actually changed.
    pub fn successful(self) -> bool {
        self == OperationStatus::Success
    }

    pub fn from_reverted(reverted: bool) -> Self {
        match reverted {
            true => OperationStatus::Failure,
            false => OperationStatus::Success,
        }
    }
}

/// One balance delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Position in the transaction's list, starting at zero.
    pub index: usize,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub status: OperationStatus,
    pub account: Address,
    /// Negative for debits.
    #[serde(serialize_with = "crate::decimal::serialize")]
    pub amount: BigInt,
    pub currency: Currency,
    /// The other half of a debit/credit pair.
    pub related: BTreeSet<usize>,
}
