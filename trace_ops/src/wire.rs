//! Payload shapes as the RSK node (`rskj`) sends them over JSON-RPC.
//!
//! Field names and nesting follow the node verbatim. Nothing here is
//! validated: quantities and addresses stay strings until [`crate::frame`]
//! turns a [`Trace`] into a [`crate::TraceFrame`].

use num_bigint::BigUint;
use rsk_common::{decode_quantity, MalformedQuantity};
use serde::{Deserialize, Serialize};

/// A block, as returned by `eth_getBlockByNumber` with full transactions.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: String,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: String,
    /// Beneficiary of the block's fees.
    #[serde(default)]
    pub miner: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub transaction_index: Option<String>,
    pub from: String,
    /// `None` for contract creations.
    #[serde(default)]
    pub to: Option<String>,
    pub gas_price: String,
    pub gas: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    pub gas_used: String,
    /// `0x1` on success, `0x0` on failure.
    #[serde(default)]
    pub status: Option<String>,
}

/// Top level of a `debug_traceTransaction` result.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub reverted: bool,
    /// Present when the transaction executed contract code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_invoke: Option<ProgramInvoke>,
    /// Present for plain value transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_invoke: Option<TransferInvoke>,
    /// Set when the transaction created a contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, rename = "subtraces")]
    pub sub_traces: Vec<SubTrace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub struct_logs: Vec<StructLog>,
}

/// An inner call frame.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTrace {
    pub trace_type: String,
    #[serde(default)]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_data: Option<serde_json::Value>,
    #[serde(default)]
    pub creation_method: Option<String>,
    #[serde(default)]
    pub invoke_data: Option<InvokeData>,
    #[serde(default)]
    pub program_result: Option<ProgramResult>,
    #[serde(default)]
    pub code_address: Option<String>,
    #[serde(default, rename = "subtraces")]
    pub sub_traces: Vec<SubTrace>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramResult {
    #[serde(default)]
    pub revert: bool,
    #[serde(default)]
    pub gas_used: Option<Quantity>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInvoke {
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub caller_address: Option<String>,
    #[serde(default)]
    pub gas: Option<Quantity>,
    #[serde(default)]
    pub call_value: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeData {
    #[serde(flatten)]
    pub transfer: TransferInvoke,
    /// Call data.
    #[serde(default, with = "crate::hex")]
    pub data_value: Vec<u8>,
    #[serde(default)]
    pub data_size: Option<String>,
}

/// The node reports the invocation either flat or nested under
/// `invokeData`, depending on the trace flavour.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInvoke {
    #[serde(flatten)]
    pub transfer: TransferInvoke,
    #[serde(default)]
    pub invoke_data: Option<InvokeData>,
}

impl ProgramInvoke {
    /// The invocation fields, preferring the nested form.
    pub fn invocation(&self) -> &TransferInvoke {
        match &self.invoke_data {
            Some(data) => &data.transfer,
            None => &self.transfer,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLog {
    pub op: String,
    pub depth: i64,
    pub pc: i64,
    pub gas: i64,
    pub gas_cost: i64,
}

/// Gas figures are JSON numbers in some trace flavours and hex strings in
/// others.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(u64),
    Hex(String),
}

impl Quantity {
    pub fn decode(&self) -> Result<BigUint, MalformedQuantity> {
        match self {
            Quantity::Number(n) => Ok(BigUint::from(*n)),
            Quantity::Hex(s) => decode_quantity(s),
        }
    }
}
