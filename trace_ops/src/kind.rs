use alloy::primitives::{address, Address};
use serde::Serialize;

use crate::wire::{Receipt, Transaction};

/// Receives the per-block fee redistribution.
pub const REMASC_ADDRESS: Address = address!("0000000000000000000000000000000001000008");

/// The two-way peg precompile.
pub const BRIDGE_ADDRESS: Address = address!("0000000000000000000000000000000001000006");

/// What a transaction is, from the reconciler's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[strum(serialize = "remasc")]
    Remasc,
    #[strum(serialize = "bridge")]
    Bridge,
    #[strum(serialize = "contract creation")]
    ContractCreation,
    #[strum(serialize = "normal")]
    Normal,
    #[strum(serialize = "contract call")]
    ContractCall,
}

impl TransactionKind {
    pub fn classify(tx: &Transaction, receipt: &Receipt) -> Self {
        let to = tx
            .to
            .as_deref()
            .filter(|it| !it.is_empty())
            .and_then(|it| it.parse::<Address>().ok());
        let creates = receipt
            .contract_address
            .as_deref()
            .is_some_and(|it| !it.is_empty());

        match to {
            Some(to) if to == REMASC_ADDRESS => TransactionKind::Remasc,
            Some(to) if to == BRIDGE_ADDRESS => TransactionKind::Bridge,
            None => TransactionKind::ContractCreation,
            Some(_) if creates => TransactionKind::ContractCreation,
            Some(_) => match tx.input.as_deref() {
                None | Some("") | Some("0x") => TransactionKind::Normal,
                Some(_) => TransactionKind::ContractCall,
            },
        }
    }
}
