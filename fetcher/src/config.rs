//! Settings, from flags or the environment.

use std::time::Duration;

use alloy::rpc::client::RpcClient;
use anyhow::{bail, Context as _};
use clap::{Parser, ValueEnum};
use trace_ops::{NetworkProfile, UnknownNetwork};
use url::Url;

use crate::rpc::{retry::build_http_retry_client, FetchOptions};

/// Whether a node is reachable at all.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum Mode {
    #[value(name = "ONLINE")]
    Online,
    #[value(name = "OFFLINE")]
    Offline,
}

#[derive(Parser, Clone, Debug)]
#[command(name = "trace_fetcher")]
pub struct Config {
    /// `ONLINE` or `OFFLINE`; there is no default.
    #[arg(long, env = "MODE", value_enum)]
    pub mode: Mode,
    /// `MAINNET` or `TESTNET`.
    #[arg(long, env = "NETWORK")]
    pub network: Option<String>,
    /// The node's JSON-RPC endpoint.
    #[arg(long, env = "RSKJ", default_value = "http://localhost:4444")]
    pub rpc_url: Url,
    /// Requests per JSON-RPC batch.
    #[arg(long, env = "TRACE_CHUNK_SIZE", default_value_t = 32)]
    pub chunk_size: usize,
    /// Batches in flight at once.
    #[arg(long, env = "TRACE_MAX_CONCURRENCY", default_value_t = 8)]
    pub max_concurrency: usize,
    /// Per-batch timeout in milliseconds; 0 disables it.
    #[arg(long, env = "TRACE_FETCH_TIMEOUT_MS", default_value_t = 30_000)]
    pub fetch_timeout: u64,
    /// Backoff in milliseconds for retry requests.
    #[arg(long, env = "RPC_BACKOFF_MS", default_value_t = 250)]
    pub backoff: u64,
    /// The maximum number of retries.
    #[arg(long, env = "RPC_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,
}

impl Config {
    /// Read the environment, after loading a local `.env` if present.
    ///
    /// Command line arguments are not consulted.
    pub fn from_env() -> anyhow::Result<Self> {
        crate::env::load_dotenvy_vars_if_present();
        Self::try_parse_from([env!("CARGO_PKG_NAME")]).context("invalid configuration")
    }

    pub fn network_profile(&self) -> Result<NetworkProfile, UnknownNetwork> {
        trace_ops::resolve(self.network.as_deref().unwrap_or_default())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            chunk_size: self.chunk_size,
            max_concurrency: self.max_concurrency,
            timeout: match self.fetch_timeout {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    pub fn build_client(&self) -> anyhow::Result<RpcClient> {
        if self.mode == Mode::Offline {
            bail!("no RPC client in offline mode");
        }
        Ok(build_http_retry_client(
            self.rpc_url.clone(),
            self.backoff,
            self.max_retries,
        ))
    }
}
