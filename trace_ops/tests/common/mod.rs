use alloy::primitives::Address;
use serde_json::{json, Value};
use trace_ops::wire::{Receipt, Transaction};
use trace_ops::{Network, NetworkProfile, Operation, TraceFrame};

pub fn a(n: u8) -> Address {
    Address::with_last_byte(n)
}

pub fn hex_addr(address: Address) -> String {
    format!("0x{}", hex::encode(address))
}

pub fn invoke(caller: Address, owner: Address, value: &str) -> Value {
    json!({
        "callerAddress": hex_addr(caller),
        "ownerAddress": hex_addr(owner),
        "gas": "0x5208",
        "callValue": value,
    })
}

pub fn with_data(mut invoke: Value, data: &[u8]) -> Value {
    invoke["dataValue"] = json!(format!("0x{}", hex::encode(data)));
    invoke
}

/// `debug_traceTransaction` result for a transaction sent to `owner`.
pub fn root(caller: Address, owner: Address, value: &str, subtraces: Vec<Value>) -> Value {
    json!({
        "reverted": false,
        "transferInvoke": invoke(caller, owner, value),
        "subtraces": subtraces,
    })
}

pub fn sub(trace_type: &str, invoke: Value, revert: bool, subtraces: Vec<Value>) -> Value {
    json!({
        "traceType": trace_type,
        "invokeData": invoke,
        "programResult": { "revert": revert, "gasUsed": "0x0" },
        "subtraces": subtraces,
    })
}

pub fn tx(from: Address, gas_price: &str) -> Transaction {
    Transaction {
        hash: "0x9f7a5c1d1f1a7b30f6df4b2c0e1e9d44a3c8c8f3b6a1b4c9d0e2f3a4b5c6d7e8".into(),
        from: hex_addr(from),
        to: Some(hex_addr(a(0xb))),
        gas_price: gas_price.into(),
        gas: "0x5208".into(),
        input: Some("0x".into()),
        ..Default::default()
    }
}

pub fn receipt(gas_used: &str) -> Receipt {
    Receipt {
        gas_used: gas_used.into(),
        status: Some("0x1".into()),
        ..Default::default()
    }
}

pub fn mainnet() -> NetworkProfile {
    NetworkProfile::for_network(Network::Mainnet)
}

pub fn frame(value: Value) -> TraceFrame {
    TraceFrame::from_json(value).unwrap()
}

/// `(account, amount)` per operation, the shape most assertions care about.
pub fn deltas(ops: &[Operation]) -> Vec<(Address, i128)> {
    ops.iter()
        .map(|op| (op.account, i128::try_from(&op.amount).unwrap()))
        .collect()
}
