//! An [RSK node](https://github.com/rsksmart/rskj) can tell you everything a
//! transaction did through `debug_traceTransaction`: a tree of
//! call/create/self-destruct frames, with values as hex strings.
//!
//! A ledger wants something flatter: an ordered list of balance deltas,
//! each with a status and a currency, where every debit has a matching
//! credit.
//!
//! This library gets you from one to the other.
//!
//! 1. Payloads arrive in the shapes of [`wire`], exactly as the node spells
//!    them.
//! 2. [`TraceFrame::from_json`] (or [`TraceFrame::from_trace`]) validates a
//!    trace once, producing a tree of tagged [`FrameKind`]s.
//! 3. [`extract`] walks that tree, parameterized by a [`NetworkProfile`],
//!    and produces the [`Operation`]s.
//!
//! # Non-Goals
//! - Consensus validation.
//! - Executing bytecode.
//! - Tracking running balances.
//!
//! # Revert status
//! The node flags a frame as reverted only when that frame itself reverted,
//! not when one of its ancestors did. [`extract`] carries a revert down to
//! every descendant, which is a no-op for nodes that already do so.

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_debug_implementations)]

mod classify;
mod currency;
mod extract;
mod frame;
mod kind;
mod network;
mod operation;
pub mod token;
pub mod wire;

pub use classify::{categorize, is_call_like, is_create_like, TraceCategory};
pub use currency::{resolve_currency, Currency, UnknownCurrency};
pub use extract::{extract, transaction_operations, ExtractError, TransactionOperations};
pub use frame::{DecodeError, FrameKind, TraceFrame, TraceType};
pub use kind::{TransactionKind, BRIDGE_ADDRESS, REMASC_ADDRESS};
pub use network::{
    resolve, BlockIdentifier, Network, NetworkIdentifier, NetworkProfile, UnknownNetwork,
    NODE_VERSION,
};
pub use operation::{Operation, OperationStatus, OperationType};

/// Like `#[serde(with = "hex")`, but tolerates and emits leading `0x` prefixes
mod hex {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: hex::ToHex,
    {
        let s = data.encode_hex::<String>();
        serializer.serialize_str(&format!("0x{}", s))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, T>(deserializer: D) -> Result<T, D::Error>
    where
        T: hex::FromHex,
        T::Error: std::fmt::Display,
    {
        let s = String::deserialize(deserializer)?;
        match s.strip_prefix("0x") {
            Some(rest) => T::from_hex(rest),
            None => T::from_hex(&*s),
        }
        .map_err(D::Error::custom)
    }
}

/// Big integers as decimal strings, which JSON numbers cannot hold.
mod decimal {
    use serde::Serializer;

    pub fn serialize<S: Serializer, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: std::fmt::Display,
    {
        serializer.collect_str(value)
    }
}
