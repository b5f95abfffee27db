//! ERC-20 call data.

use alloy::primitives::Address;
use num_bigint::BigUint;

/// `transfer(address,uint256)`
pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// `transferFrom(address,address,uint256)`
pub const TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

const WORD: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: BigUint,
}

/// Decode a token transfer from the call data of a call made by `caller`.
///
/// Returns [`None`] for other selectors and for arguments that do not
/// ABI-decode, since the token contract would reject those too.
pub fn decode_transfer(caller: Address, input: &[u8]) -> Option<TokenTransfer> {
    let (selector, args) = input.split_first_chunk::<4>()?;
    match *selector {
        TRANSFER => Some(TokenTransfer {
            from: caller,
            to: address_word(args, 0)?,
            amount: uint_word(args, 1)?,
        }),
        TRANSFER_FROM => Some(TokenTransfer {
            from: address_word(args, 0)?,
            to: address_word(args, 1)?,
            amount: uint_word(args, 2)?,
        }),
        _ => None,
    }
}

fn word(args: &[u8], ix: usize) -> Option<&[u8]> {
    args.get(ix * WORD..(ix + 1) * WORD)
}

fn address_word(args: &[u8], ix: usize) -> Option<Address> {
    let (padding, address) = word(args, ix)?.split_at(WORD - 20);
    match padding.iter().all(|it| *it == 0) {
        true => Some(Address::from_slice(address)),
        false => None,
    }
}

fn uint_word(args: &[u8], ix: usize) -> Option<BigUint> {
    word(args, ix).map(BigUint::from_bytes_be)
}
