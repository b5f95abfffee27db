//! Validated trace frames.
//!
//! A [`wire::Trace`] is loosely typed: which fields are present depends on
//! the kind of frame. [`TraceFrame::from_trace`] checks everything once, so
//! the extractor never has to ask whether a field is there.

use std::str::FromStr as _;

use alloy::primitives::Address;
use num_bigint::BigUint;
use num_traits::Zero as _;
use rsk_common::{decode_quantity, MalformedQuantity};
use serde::Serialize;

use crate::wire::{SubTrace, Trace, TransferInvoke};

/// The EVM operation that opened a frame.
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
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum TraceType {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
    /// `rskj` still calls this `SUICIDE`.
    #[strum(to_string = "SELFDESTRUCT", serialize = "SUICIDE")]
    SelfDestruct,
}

/// One level of the call tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFrame {
    pub kind: FrameKind,
    /// Whether the node flagged this frame itself as reverted.
    pub reverted: bool,
    /// Not reported for the outermost frame; the receipt carries it.
    pub gas_used: Option<BigUint>,
    /// In call order.
    pub children: Vec<TraceFrame>,
}

/// What a frame did, with exactly the fields that kind needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// `CALL`, `CALLCODE`, `DELEGATECALL` or `STATICCALL`.
    Call {
        trace_type: TraceType,
        caller: Address,
        owner: Address,
        value: BigUint,
        input: Vec<u8>,
    },
    /// `CREATE` or `CREATE2`; `created` is the new contract.
    Create {
        trace_type: TraceType,
        caller: Address,
        created: Address,
        value: BigUint,
    },
    /// `account` sends its whole `balance` to `beneficiary` and is deleted
    /// at the end of the transaction.
    SelfDestruct {
        account: Address,
        beneficiary: Address,
        balance: BigUint,
    },
    /// A frame type we do not emit operations for.
    Other { tag: String },
}

impl FrameKind {
    pub fn trace_type(&self) -> Option<TraceType> {
        match self {
            FrameKind::Call { trace_type, .. } | FrameKind::Create { trace_type, .. } => {
                Some(*trace_type)
            }
            FrameKind::SelfDestruct { .. } => Some(TraceType::SelfDestruct),
            FrameKind::Other { .. } => None,
        }
    }

    /// The value moved by this frame, zero for [`FrameKind::Other`].
    pub fn value(&self) -> BigUint {
        match self {
            FrameKind::Call { value, .. } | FrameKind::Create { value, .. } => value.clone(),
            FrameKind::SelfDestruct { balance, .. } => balance.clone(),
            FrameKind::Other { .. } => BigUint::zero(),
        }
    }
}

/// A trace payload could not be turned into a [`TraceFrame`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{path}: {source}")]
    Quantity {
        path: String,
        #[source]
        source: MalformedQuantity,
    },
    #[error("{path}: malformed address {value:?}")]
    Address { path: String, value: String },
    #[error("{path}: missing field")]
    MissingField { path: String },
    #[error(transparent)]
    Json(#[from] serde_path_to_error::Error<serde_json::Error>),
}

impl TraceFrame {
    /// Parse a raw `debug_traceTransaction` result and validate it.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DecodeError> {
        let trace: Trace = serde_path_to_error::deserialize(value)?;
        Self::from_trace(&trace)
    }

    /// Validate the outermost frame of a transaction and all its children.
    ///
    /// The outermost frame is a `CREATE` when the node reports a
    /// `contractAddress`, otherwise a `CALL`.
    pub fn from_trace(trace: &Trace) -> Result<Self, DecodeError> {
        let (invoke, path) = match (&trace.transfer_invoke, &trace.program_invoke) {
            (Some(transfer), _) => (transfer, "transferInvoke"),
            (None, Some(program)) => (program.invocation(), "programInvoke"),
            (None, None) => {
                return Err(DecodeError::MissingField {
                    path: "transferInvoke".into(),
                })
            }
        };

        let caller = required_address(&invoke.caller_address, &format!("{path}.callerAddress"))?;
        let value = call_value(invoke, path)?;
        let kind = match non_empty(&trace.contract_address) {
            Some(created) => FrameKind::Create {
                trace_type: TraceType::Create,
                caller,
                created: parse_address(created, "contractAddress")?,
                value,
            },
            None => FrameKind::Call {
                trace_type: TraceType::Call,
                caller,
                owner: required_address(&invoke.owner_address, &format!("{path}.ownerAddress"))?,
                value,
                input: match &trace.program_invoke {
                    Some(program) => program
                        .invoke_data
                        .as_ref()
                        .map(|data| data.data_value.clone())
                        .unwrap_or_default(),
                    None => Vec::new(),
                },
            },
        };

        Ok(TraceFrame {
            kind,
            reverted: trace.reverted,
            gas_used: None,
            children: children(&trace.sub_traces, "subtraces")?,
        })
    }

    fn from_sub_trace(sub: &SubTrace, path: &str) -> Result<Self, DecodeError> {
        let trace_type = match wire_trace_type(sub) {
            Some(it) => it,
            None => {
                return Ok(TraceFrame {
                    kind: FrameKind::Other {
                        tag: sub.trace_type.clone(),
                    },
                    reverted: sub.program_result.as_ref().is_some_and(|it| it.revert),
                    gas_used: gas_used(sub, path)?,
                    children: children(&sub.sub_traces, &format!("{path}.subtraces"))?,
                })
            }
        };

        let data_path = format!("{path}.invokeData");
        let data = sub
            .invoke_data
            .as_ref()
            .ok_or_else(|| DecodeError::MissingField {
                path: data_path.clone(),
            })?;
        let invoke = &data.transfer;
        let caller = required_address(
            &invoke.caller_address,
            &format!("{data_path}.callerAddress"),
        )?;
        let owner = required_address(&invoke.owner_address, &format!("{data_path}.ownerAddress"))?;
        let value = call_value(invoke, &data_path)?;

        let kind = match trace_type {
            TraceType::Call | TraceType::CallCode | TraceType::DelegateCall | TraceType::StaticCall => {
                FrameKind::Call {
                    trace_type,
                    caller,
                    owner,
                    value,
                    input: data.data_value.clone(),
                }
            }
            TraceType::Create | TraceType::Create2 => FrameKind::Create {
                trace_type,
                caller,
                created: owner,
                value,
            },
            TraceType::SelfDestruct => FrameKind::SelfDestruct {
                account: caller,
                beneficiary: owner,
                balance: value,
            },
        };

        Ok(TraceFrame {
            kind,
            reverted: sub.program_result.as_ref().is_some_and(|it| it.revert),
            gas_used: gas_used(sub, path)?,
            children: children(&sub.sub_traces, &format!("{path}.subtraces"))?,
        })
    }

    /// Number of frames in this tree, including `self`.
    pub fn frame_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(frame) = stack.pop() {
            count += 1;
            stack.extend(frame.children.iter());
        }
        count
    }
}

/// `traceType` names the broad category, `callType` / `creationMethod`
/// refine it. `None` means the frame is of a kind we ignore.
fn wire_trace_type(sub: &SubTrace) -> Option<TraceType> {
    let broad = TraceType::from_str(&sub.trace_type).ok()?;
    let refined = match broad {
        TraceType::Call => sub.call_type.as_deref(),
        TraceType::Create => sub.creation_method.as_deref(),
        _ => None,
    };
    match refined.and_then(|it| TraceType::from_str(it).ok()) {
        Some(it) if it.category() == broad.category() => Some(it),
        _ => Some(broad),
    }
}

fn children(subs: &[SubTrace], path: &str) -> Result<Vec<TraceFrame>, DecodeError> {
    subs.iter()
        .enumerate()
        .map(|(ix, sub)| TraceFrame::from_sub_trace(sub, &format!("{path}[{ix}]")))
        .collect()
}

fn gas_used(sub: &SubTrace, path: &str) -> Result<Option<BigUint>, DecodeError> {
    sub.program_result
        .as_ref()
        .and_then(|it| it.gas_used.as_ref())
        .map(|gas| {
            gas.decode().map_err(|source| DecodeError::Quantity {
                path: format!("{path}.programResult.gasUsed"),
                source,
            })
        })
        .transpose()
}

fn call_value(invoke: &TransferInvoke, path: &str) -> Result<BigUint, DecodeError> {
    let path = format!("{path}.callValue");
    let raw = invoke
        .call_value
        .as_deref()
        .ok_or_else(|| DecodeError::MissingField { path: path.clone() })?;
    decode_quantity(raw).map_err(|source| DecodeError::Quantity { path, source })
}

fn required_address(value: &Option<String>, path: &str) -> Result<Address, DecodeError> {
    match non_empty(value) {
        Some(it) => parse_address(it, path),
        None => Err(DecodeError::MissingField { path: path.into() }),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|it| !it.is_empty())
}

pub(crate) fn parse_address(value: &str, path: &str) -> Result<Address, DecodeError> {
    Address::from_str(value).map_err(|_| DecodeError::Address {
        path: path.into(),
        value: value.into(),
    })
}
