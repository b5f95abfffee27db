//! Trace tree -> ordered ledger operations.

use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::Address;
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed as _, Zero as _};
use rsk_common::{decode_quantity, MalformedQuantity};
use serde::Serialize;
use tracing::{debug, trace};

use crate::wire::{Receipt, Transaction};
use crate::{
    resolve_currency, token, Currency, FrameKind, NetworkProfile, Operation, OperationStatus,
    OperationType, TraceFrame, TraceType, TransactionKind, UnknownCurrency,
};

/// Everything that aborts the extraction of one transaction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{field}: {source}")]
    MalformedQuantity {
        field: &'static str,
        #[source]
        source: MalformedQuantity,
    },
    #[error("{field}: malformed address {value:?}")]
    MalformedAddress { field: &'static str, value: String },
    #[error(transparent)]
    UnknownCurrency(#[from] UnknownCurrency),
}

/// The operations of one transaction, as handed to the reconciler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionOperations {
    pub hash: String,
    pub kind: TransactionKind,
    pub operations: Vec<Operation>,
}

/// Turn one transaction's trace into ledger operations.
///
/// The list always starts with the fee pair: `tx.from` pays
/// `receipt.gasUsed * tx.gasPrice` to `miner`, successfully, whatever the
/// transaction's outcome. Then every frame, in depth-first pre-order, that
/// moves a non-zero value contributes a debit/credit pair. A reverted frame
/// turns its own pairs and those of all its descendants into
/// [`OperationStatus::Failure`].
///
/// Accounts that self-destructed (in a frame that was not reverted) and do not
/// end up empty once the whole tree has been walked get a trailing
/// [`OperationType::Destruct`] pair that settles the residual against
/// [`Address::ZERO`].
///
/// Either the whole list is returned or nothing is.
pub fn extract(
    tx: &Transaction,
    receipt: &Receipt,
    miner: Address,
    root: &TraceFrame,
    profile: &NetworkProfile,
) -> Result<Vec<Operation>, ExtractError> {
    let mut ledger = Ledger::new(profile);

    let sender = parse_address("from", &tx.from)?;
    let gas_used = quantity("gasUsed", &receipt.gas_used)?;
    let gas_price = quantity("gasPrice", &tx.gas_price)?;
    ledger.pair(
        OperationType::Fee,
        OperationStatus::Success,
        sender,
        miner,
        &(gas_used * gas_price),
        profile.native_currency().clone(),
    );

    let mut events = Vec::new();
    let mut stack = vec![(root, false)];
    while let Some((frame, ancestor_reverted)) = stack.pop() {
        let reverted = ancestor_reverted || frame.reverted;
        let status = OperationStatus::from_reverted(reverted);
        ledger.visit(frame, status, &mut events)?;
        stack.extend(frame.children.iter().rev().map(|child| (child, reverted)));
    }

    ledger.settle(events);

    debug!(
        tx = %tx.hash,
        operations = ledger.ops.len(),
        "extracted operations"
    );
    Ok(ledger.ops)
}

/// Where a self-destruct or a creation happened, relative to the operations.
enum Event {
    Destroyed {
        account: Address,
        /// Index of the first operation after the destruction.
        at: usize,
        status: OperationStatus,
        /// Balance burnt in place, for an account that named itself
        /// beneficiary.
        retained: BigUint,
    },
    /// A creation at a previously destroyed address brings it back.
    Created { account: Address },
}

struct Ledger<'a> {
    profile: &'a NetworkProfile,
    ops: Vec<Operation>,
}

impl<'a> Ledger<'a> {
    fn new(profile: &'a NetworkProfile) -> Self {
        Self {
            profile,
            ops: Vec::new(),
        }
    }

    fn native(&self) -> Currency {
        self.profile.native_currency().clone()
    }

    /// Push a debit on `from` and a credit on `to` that reference each other.
    fn pair(
        &mut self,
        op_type: OperationType,
        status: OperationStatus,
        from: Address,
        to: Address,
        amount: &BigUint,
        currency: Currency,
    ) {
        let debit = self.ops.len();
        let credit = debit + 1;
        let amount = BigInt::from(amount.clone());
        self.ops.push(Operation {
            index: debit,
            op_type,
            status,
            account: from,
            amount: -amount.clone(),
            currency: currency.clone(),
            related: BTreeSet::from([credit]),
        });
        self.ops.push(Operation {
            index: credit,
            op_type,
            status,
            account: to,
            amount,
            currency,
            related: BTreeSet::from([debit]),
        });
    }

    fn visit(
        &mut self,
        frame: &TraceFrame,
        status: OperationStatus,
        events: &mut Vec<Event>,
    ) -> Result<(), ExtractError> {
        match &frame.kind {
            FrameKind::Call {
                trace_type,
                caller,
                owner,
                value,
                input,
            } => {
                if !value.is_zero() {
                    let native = self.native();
                    self.pair((*trace_type).into(), status, *caller, *owner, value, native);
                }
                if *trace_type == TraceType::Call && self.profile.is_token(owner) {
                    self.token_transfer(*caller, *owner, input, status)?;
                }
            }
            FrameKind::Create {
                trace_type,
                caller,
                created,
                value,
            } => {
                if !value.is_zero() {
                    let native = self.native();
                    self.pair((*trace_type).into(), status, *caller, *created, value, native);
                }
                events.push(Event::Created { account: *created });
            }
            FrameKind::SelfDestruct {
                account,
                beneficiary,
                balance,
            } => {
                let retained = match account == beneficiary {
                    true => balance.clone(),
                    false => {
                        if !balance.is_zero() {
                            let native = self.native();
                            self.pair(
                                OperationType::SelfDestruct,
                                status,
                                *account,
                                *beneficiary,
                                balance,
                                native,
                            );
                        }
                        BigUint::zero()
                    }
                };
                events.push(Event::Destroyed {
                    account: *account,
                    at: self.ops.len(),
                    status,
                    retained,
                });
            }
            FrameKind::Other { tag } => trace!(%tag, "no operations for frame"),
        }
        Ok(())
    }

    /// Calls into unregistered contracts, or with data that is not a token
    /// transfer, are not visible.
    fn token_transfer(
        &mut self,
        caller: Address,
        contract: Address,
        input: &[u8],
        status: OperationStatus,
    ) -> Result<(), ExtractError> {
        let Some(transfer) = token::decode_transfer(caller, input) else {
            trace!(%contract, "call data is not a token transfer");
            return Ok(());
        };
        if transfer.amount.is_zero() {
            return Ok(());
        }
        let currency = resolve_currency(Some(&contract), self.profile)?;
        self.pair(
            OperationType::Call,
            status,
            transfer.from,
            transfer.to,
            &transfer.amount,
            currency,
        );
        Ok(())
    }

    /// Second pass: settle the native residual of every self-destructed
    /// account.
    ///
    /// Only a destruction that took effect counts, and the latest one wins:
    /// the residual is what it retained plus every successful native
    /// operation on it since.
    fn settle(&mut self, events: Vec<Event>) {
        struct Tracked {
            at: usize,
            status: OperationStatus,
            retained: BigUint,
        }

        let mut tracked = BTreeMap::<Address, Tracked>::new();
        for event in events {
            match event {
                Event::Destroyed {
                    account,
                    at,
                    status,
                    retained,
                } => match status.successful() {
                    true => {
                        tracked.insert(
                            account,
                            Tracked {
                                at,
                                status,
                                retained,
                            },
                        );
                    }
                    false => trace!(%account, "reverted self-destruct"),
                },
                Event::Created { account } => {
                    tracked.remove(&account);
                }
            }
        }

        let native = self.native();
        for (account, Tracked { at, status, retained }) in tracked {
            let residual = self.ops[at..]
                .iter()
                .filter(|op| op.account == account)
                .filter(|op| op.status.successful() && op.currency == native)
                .fold(BigInt::from(retained), |acc, op| acc + &op.amount);

            let (from, to) = match residual.is_negative() {
                true => (Address::ZERO, account),
                false => (account, Address::ZERO),
            };
            let residual = residual.magnitude();
            if residual.is_zero() {
                continue;
            }
            debug!(%account, %residual, %to, "settling self-destructed account");
            self.pair(
                OperationType::Destruct,
                status,
                from,
                to,
                residual,
                native.clone(),
            );
        }
    }
}

fn quantity(field: &'static str, value: &str) -> Result<BigUint, ExtractError> {
    decode_quantity(value).map_err(|source| ExtractError::MalformedQuantity { field, source })
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ExtractError> {
    value
        .parse()
        .map_err(|_| ExtractError::MalformedAddress {
            field,
            value: value.to_owned(),
        })
}

/// Extract and classify one transaction.
pub fn transaction_operations(
    tx: &Transaction,
    receipt: &Receipt,
    miner: Address,
    root: &TraceFrame,
    profile: &NetworkProfile,
) -> Result<TransactionOperations, ExtractError> {
    Ok(TransactionOperations {
        hash: tx.hash.clone(),
        kind: TransactionKind::classify(tx, receipt),
        operations: extract(tx, receipt, miner, root, profile)?,
    })
}
