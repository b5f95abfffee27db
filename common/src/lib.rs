//! Shared helpers for the RSK trace workspace.
//!
//! Every numeric field a node hands us (gas, values, balances, block
//! numbers) arrives as a `0x`-prefixed hex string. [`decode_quantity`] turns
//! those into arbitrary-precision integers without ever truncating.

use num_bigint::BigUint;
use num_traits::Zero as _;

/// Number of decimals of RBTC, the native currency.
pub const NATIVE_DECIMALS: i32 = 18;

/// Why a quantity string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityFault {
    /// The string was empty.
    Empty,
    /// The string did not start with a lowercase `0x`.
    MissingPrefix,
    /// A character after the prefix was not a hex digit.
    InvalidDigit {
        /// Offset of the offending character, counted after the prefix.
        position: usize,
        /// The offending character.
        found: char,
    },
}

impl std::fmt::Display for QuantityFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityFault::Empty => f.write_str("empty string"),
            QuantityFault::MissingPrefix => f.write_str("missing `0x` prefix"),
            QuantityFault::InvalidDigit { position, found } => {
                write!(f, "invalid hex digit {found:?} at position {position}")
            }
        }
    }
}

/// A hex quantity could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed quantity {input:?}: {fault}")]
pub struct MalformedQuantity {
    /// The rejected input, verbatim.
    pub input: String,
    /// What was wrong with it.
    pub fault: QuantityFault,
}

impl MalformedQuantity {
    fn new(input: &str, fault: QuantityFault) -> Self {
        Self {
            input: input.to_owned(),
            fault,
        }
    }
}

/// Decode a `0x`-prefixed hex quantity.
///
/// `0x` and `0x0` both decode to zero. Leading zeros are accepted and there
/// is no upper bound on the magnitude.
pub fn decode_quantity(input: &str) -> Result<BigUint, MalformedQuantity> {
    if input.is_empty() {
        return Err(MalformedQuantity::new(input, QuantityFault::Empty));
    }
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| MalformedQuantity::new(input, QuantityFault::MissingPrefix))?;
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }

    // `hex` only accepts whole bytes
    let padded = match digits.len() % 2 {
        0 => digits.to_owned(),
        _ => format!("0{digits}"),
    };
    let pad = padded.len() - digits.len();
    match hex::decode(&padded) {
        Ok(bytes) => Ok(BigUint::from_bytes_be(&bytes)),
        Err(hex::FromHexError::InvalidHexCharacter { c, index }) => Err(MalformedQuantity::new(
            input,
            QuantityFault::InvalidDigit {
                position: index - pad,
                found: c,
            },
        )),
        // length is even by construction
        Err(other) => unreachable!("unexpected hex error: {other}"),
    }
}

/// Canonical encoding: lowercase, `0x`-prefixed, no leading zeros.
pub fn encode_quantity(value: &BigUint) -> String {
    format!("{value:#x}")
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng as _, SeedableRng as _};

    use super::*;

    #[test]
    fn zero_forms() {
        assert_eq!(decode_quantity("0x").unwrap(), BigUint::zero());
        assert_eq!(decode_quantity("0x0").unwrap(), BigUint::zero());
        assert_eq!(decode_quantity("0x0000").unwrap(), BigUint::zero());
    }

    #[test]
    fn small_values() {
        assert_eq!(decode_quantity("0x64").unwrap(), BigUint::from(100u8));
        assert_eq!(decode_quantity("0x5208").unwrap(), BigUint::from(21_000u32));
        assert_eq!(
            decode_quantity("0x3B9ACA00").unwrap(),
            BigUint::from(1_000_000_000u32)
        );
        // odd number of digits
        assert_eq!(decode_quantity("0xfff").unwrap(), BigUint::from(4095u32));
    }

    #[test]
    fn wider_than_u64() {
        let value = decode_quantity("0x1000000000000000000000000000000000").unwrap();
        assert_eq!(value, BigUint::from(1u8) << 132);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(decode_quantity("").unwrap_err().fault, QuantityFault::Empty);
        assert_eq!(
            decode_quantity("12").unwrap_err().fault,
            QuantityFault::MissingPrefix
        );
        assert_eq!(
            decode_quantity("0X1f").unwrap_err().fault,
            QuantityFault::MissingPrefix
        );
        assert_eq!(
            decode_quantity("0xZZ").unwrap_err().fault,
            QuantityFault::InvalidDigit {
                position: 0,
                found: 'Z'
            }
        );
        assert_eq!(
            decode_quantity("0x12g").unwrap_err().fault,
            QuantityFault::InvalidDigit {
                position: 2,
                found: 'g'
            }
        );
        assert!(decode_quantity("0x-1").is_err());
        assert!(decode_quantity("0x 1").is_err());
    }

    #[test]
    fn encode_is_canonical() {
        assert_eq!(encode_quantity(&BigUint::zero()), "0x0");
        assert_eq!(encode_quantity(&BigUint::from(255u8)), "0xff");
    }

    #[test]
    fn decode_inverts_encode() {
        let mut rng = StdRng::seed_from_u64(30);
        for _ in 0..512 {
            let len = rng.gen_range(0..48);
            let bytes = (0..len).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
            let n = BigUint::from_bytes_be(&bytes);
            assert_eq!(decode_quantity(&encode_quantity(&n)).unwrap(), n);
        }
    }
}
