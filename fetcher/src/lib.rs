//! Retrieval side of the RSK ledger tooling.
//!
//! [`rpc`] turns many JSON-RPC calls into a few concurrent batches, with a
//! retrying transport underneath and a shared cancellation context on top.
//! [`block`] chains those batches into per-transaction operations for a
//! whole block.

pub mod block;
pub mod config;
pub mod env;
pub mod rpc;
pub mod tracing;

pub use rpc::{fetch_batch, fetch_receipts, fetch_traces, FetchContext, FetchError, FetchOptions};
