//! Per-network constants, resolved once at startup.

use std::collections::BTreeMap;
use std::str::FromStr as _;

use alloy::primitives::{address, b256, Address, B256};
use num_bigint::BigUint;
use rsk_common::NATIVE_DECIMALS;
use serde::Serialize;

use crate::Currency;

/// Version of `rskj` the profiles were written against.
pub const NODE_VERSION: &str = "2.2.0";

const BLOCKCHAIN: &str = "RSK";

const MAINNET_ARGUMENTS: &str =
    "-Xmx4G -Drsk.conf.file=/app/rsk/rsk.conf -cp /app/rskj-core-latest.jar co.rsk.Start";

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
#[strum(serialize_all = "UPPERCASE")]
pub enum Network {
    Mainnet,
    Testnet,
}

/// The selector did not name a supported network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct UnknownNetwork {
    pub selector: String,
}

impl std::fmt::Display for UnknownNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.selector.is_empty() {
            true => f.write_str("network selector must be populated"),
            false => write!(
                f,
                "{:?} is not a valid network, expected MAINNET or TESTNET",
                self.selector
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NetworkIdentifier {
    pub blockchain: String,
    pub network: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BlockIdentifier {
    pub hash: B256,
    pub index: u64,
}

/// Everything that differs between deployed chains.
///
/// Build one with [`resolve`] or [`NetworkProfile::for_network`] and share it
/// by reference; there is no way to mutate it afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkProfile {
    network: Network,
    identifier: NetworkIdentifier,
    #[serde(serialize_with = "crate::decimal::serialize")]
    chain_id: BigUint,
    genesis_block: BlockIdentifier,
    currencies: Vec<Currency>,
    address_to_symbol: BTreeMap<Address, String>,
    symbol_to_decimals: BTreeMap<String, i32>,
    node_version: String,
    node_arguments: String,
}

/// Resolve a selector: exactly `MAINNET` or `TESTNET`.
pub fn resolve(selector: &str) -> Result<NetworkProfile, UnknownNetwork> {
    let network = Network::from_str(selector).map_err(|_| UnknownNetwork {
        selector: selector.to_owned(),
    })?;
    Ok(NetworkProfile::for_network(network))
}

/// Native currency plus the bridged tokens.
///
/// The same on both networks today.
fn currency_table(_network: Network) -> Vec<(Currency, Option<Address>)> {
    vec![
        (Currency::new("RBTC", NATIVE_DECIMALS), None),
        (
            Currency::new("RIF", 18),
            Some(address!("2acc95758f8b5f583470ba265eb685a8f45fc9d5")),
        ),
        (
            Currency::new("RDOC", 18),
            Some(address!("e700691da7b9851f2f35f8b8182c69c53ccad9db")),
        ),
        (
            Currency::new("DOC", 18),
            Some(address!("2d919f19d4892381d58edebeca66d5642cef1a1f")),
        ),
    ]
}

impl NetworkProfile {
    pub fn for_network(network: Network) -> Self {
        let (name, chain_id, genesis_hash, node_arguments) = match network {
            Network::Mainnet => (
                "Mainnet",
                30u32,
                b256!("f88529d4ab262c0f4d042e9d8d3f2472848eaafe1a9b7213f57617eb40a9f9e0"),
                MAINNET_ARGUMENTS.to_owned(),
            ),
            Network::Testnet => (
                "Testnet",
                31u32,
                b256!("cabb7fbe88cd6d922042a32ffc08ce8b1fbb37d650b9d4e7dbfe2a7469adfa42"),
                format!("{MAINNET_ARGUMENTS} --testnet"),
            ),
        };

        let table = currency_table(network);
        let address_to_symbol = table
            .iter()
            .filter_map(|(currency, address)| Some(((*address)?, currency.symbol.clone())))
            .collect::<BTreeMap<_, _>>();
        let symbol_to_decimals = table
            .iter()
            .map(|(currency, _)| (currency.symbol.clone(), currency.decimals))
            .collect::<BTreeMap<_, _>>();
        debug_assert!(address_to_symbol
            .values()
            .all(|symbol| symbol_to_decimals.contains_key(symbol)));

        Self {
            network,
            identifier: NetworkIdentifier {
                blockchain: BLOCKCHAIN.to_owned(),
                network: name.to_owned(),
            },
            chain_id: BigUint::from(chain_id),
            genesis_block: BlockIdentifier {
                hash: genesis_hash,
                index: 0,
            },
            currencies: table.into_iter().map(|(currency, _)| currency).collect(),
            address_to_symbol,
            symbol_to_decimals,
            node_version: NODE_VERSION.to_owned(),
            node_arguments,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn identifier(&self) -> &NetworkIdentifier {
        &self.identifier
    }

    pub fn chain_id(&self) -> &BigUint {
        &self.chain_id
    }

    pub fn genesis_block(&self) -> BlockIdentifier {
        self.genesis_block
    }

    /// All tracked currencies; the native one comes first.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn native_currency(&self) -> &Currency {
        // the table always starts with the native currency
        &self.currencies[0]
    }

    pub fn address_to_symbol(&self) -> &BTreeMap<Address, String> {
        &self.address_to_symbol
    }

    pub fn symbol_to_decimals(&self) -> &BTreeMap<String, i32> {
        &self.symbol_to_decimals
    }

    /// Whether `contract` is a registered token.
    pub fn is_token(&self, contract: &Address) -> bool {
        self.address_to_symbol.contains_key(contract)
    }

    pub fn node_version(&self) -> &str {
        &self.node_version
    }

    /// Command line the node is launched with.
    pub fn node_arguments(&self) -> &str {
        &self.node_arguments
    }
}
