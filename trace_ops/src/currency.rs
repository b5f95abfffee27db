use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::NetworkProfile;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: i32,
}

impl Currency {
    pub fn new(symbol: impl Into<String>, decimals: i32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// `address` is not a registered token contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no currency registered for contract {address}")]
pub struct UnknownCurrency {
    pub address: Address,
}

/// Look up the currency moved by `contract`, or the native currency for
/// `None`.
///
/// Only pre-registered token contracts resolve. Anything else is an error,
/// never a guess.
pub fn resolve_currency(
    contract: Option<&Address>,
    profile: &NetworkProfile,
) -> Result<Currency, UnknownCurrency> {
    let Some(address) = contract else {
        return Ok(profile.native_currency().clone());
    };
    let unknown = || UnknownCurrency { address: *address };
    let symbol = profile.address_to_symbol().get(address).ok_or_else(unknown)?;
    let decimals = profile
        .symbol_to_decimals()
        .get(symbol)
        .ok_or_else(unknown)?;
    Ok(Currency::new(symbol.clone(), *decimals))
}
