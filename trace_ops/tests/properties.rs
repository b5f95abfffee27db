//! Properties over seeded random trace trees.

mod common;

use std::collections::BTreeMap;

use alloy::primitives::Address;
use assert2::check;
use common::{a, mainnet, receipt, tx};
use num_bigint::{BigInt, BigUint};
use num_traits::Zero as _;
use rand::{rngs::StdRng, seq::SliceRandom as _, Rng, SeedableRng as _};
use trace_ops::{extract, FrameKind, Operation, OperationType, TraceFrame, TraceType};

const CALLERS: std::ops::Range<u8> = 1..16;
/// Few enough that the same account is destroyed, refunded and destroyed
/// again within one tree.
const DESTRUCTIBLE: std::ops::Range<u8> = 0x80..0x84;

fn account(rng: &mut impl Rng) -> Address {
    match rng.gen_bool(0.2) {
        true => a(rng.gen_range(DESTRUCTIBLE)),
        false => a(rng.gen_range(CALLERS)),
    }
}

fn value(rng: &mut impl Rng, zero: bool) -> BigUint {
    match zero || rng.gen_bool(0.3) {
        true => BigUint::zero(),
        // wider than 64 bits from time to time
        false => BigUint::from(rng.gen::<u64>()) << rng.gen_range(0..80usize),
    }
}

fn random_frame(rng: &mut impl Rng, depth: usize, zero: bool) -> TraceFrame {
    let caller = account(rng);
    let kind = match rng.gen_range(0..10) {
        0..=4 => FrameKind::Call {
            trace_type: *[
                TraceType::Call,
                TraceType::CallCode,
                TraceType::DelegateCall,
                TraceType::StaticCall,
            ]
            .choose(rng)
            .unwrap(),
            caller,
            owner: account(rng),
            value: value(rng, zero),
            input: vec![],
        },
        5 | 6 => FrameKind::Create {
            trace_type: *[TraceType::Create, TraceType::Create2].choose(rng).unwrap(),
            caller,
            created: a(rng.gen_range(0x40..0x50)),
            value: value(rng, zero),
        },
        7 | 8 => {
            let account = a(rng.gen_range(DESTRUCTIBLE));
            FrameKind::SelfDestruct {
                account,
                beneficiary: match rng.gen_bool(0.2) {
                    true => account,
                    false => a(rng.gen_range(CALLERS)),
                },
                balance: value(rng, zero),
            }
        }
        _ => FrameKind::Other {
            tag: "PRECOMPILE".into(),
        },
    };
    let children = match (depth, &kind) {
        (0, _) | (_, FrameKind::SelfDestruct { .. }) => vec![],
        _ => (0..rng.gen_range(0..4))
            .map(|_| random_frame(rng, depth - 1, zero))
            .collect(),
    };
    TraceFrame {
        kind,
        reverted: rng.gen_bool(0.15),
        gas_used: None,
        children,
    }
}

fn trees(seed: u64, zero: bool) -> impl Iterator<Item = TraceFrame> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..200).map(move |_| random_frame(&mut rng, 4, zero))
}

fn run(root: &TraceFrame) -> Vec<Operation> {
    extract(
        &tx(a(0xa), "0x3b9aca00"),
        &receipt("0x5208"),
        Address::repeat_byte(0xee),
        root,
        &mainnet(),
    )
    .unwrap()
}

#[test]
fn operations_come_in_balanced_pairs() {
    for root in trees(1, false) {
        let ops = run(&root);
        check!(ops.len() % 2 == 0);
        for (ix, op) in ops.iter().enumerate() {
            check!(op.index == ix);
            check!(op.related.len() == 1);
            let partner = &ops[*op.related.first().unwrap()];
            check!(partner.related.contains(&ix));
            check!(partner.amount == -op.amount.clone());
            check!(partner.status == op.status);
            check!(partner.currency == op.currency);
        }

        let mut sums = BTreeMap::<_, BigInt>::new();
        for op in &ops {
            *sums.entry(op.currency.symbol.clone()).or_default() += &op.amount;
        }
        check!(sums.values().all(|it| it.is_zero()));
    }
}

#[test]
fn fee_comes_first() {
    for root in trees(2, false) {
        let ops = run(&root);
        check!(ops[0].op_type == OperationType::Fee);
        check!(ops[1].op_type == OperationType::Fee);
        check!(ops[2..].iter().all(|op| op.op_type != OperationType::Fee));
    }
}

#[test]
fn destruct_operations_are_trailing() {
    for root in trees(3, false) {
        let ops = run(&root);
        let first = ops
            .iter()
            .position(|op| op.op_type == OperationType::Destruct)
            .unwrap_or(ops.len());
        check!(ops[first..]
            .iter()
            .all(|op| op.op_type == OperationType::Destruct));
    }
}

#[test]
fn zero_values_only_pay_the_fee() {
    for root in trees(4, true) {
        let ops = run(&root);
        check!(ops.len() == 2);
        check!(ops.iter().all(|op| op.op_type == OperationType::Fee));
    }
}

#[test]
fn extraction_is_deterministic() {
    for root in trees(5, false) {
        let first = serde_json::to_vec(&run(&root)).unwrap();
        let second = serde_json::to_vec(&run(&root)).unwrap();
        check!(first == second);
    }
}
