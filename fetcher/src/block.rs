//! Everything that happened to balances in one block.

use alloy::{
    primitives::{Address, B256},
    rpc::client::RpcClient,
};
use anyhow::{bail, Context as _};
use trace_ops::{
    transaction_operations, wire::Block, ExtractError, NetworkProfile, TransactionOperations,
};
use tracing::{info, warn};

use crate::rpc::{fetch_receipts, fetch_traces, FetchContext, FetchError, FetchOptions};

/// Why one transaction of a block has no operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionFailure {
    #[error("receipt: {0}")]
    Receipt(FetchError),
    #[error("trace: {0}")]
    Trace(FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Operations of every transaction in block `number`, in block order.
///
/// Only the block itself is fatal: a transaction whose receipt or trace
/// cannot be fetched, or whose trace does not add up, is reported in its own
/// slot.
pub async fn block_operations(
    client: &RpcClient,
    number: u64,
    profile: &NetworkProfile,
    options: &FetchOptions,
    ctx: &FetchContext,
) -> anyhow::Result<Vec<Result<TransactionOperations, TransactionFailure>>> {
    let request =
        client.request::<_, Option<Block>>("eth_getBlockByNumber", (format!("{number:#x}"), true));
    let block = tokio::select! {
        biased;
        _ = ctx.done() => bail!("cancelled while fetching block {number}"),
        block = request => block.with_context(|| format!("could not fetch block {number}"))?,
    }
    .with_context(|| format!("no block {number}"))?;

    let miner = block
        .miner
        .as_deref()
        .context("block has no miner")?
        .parse::<Address>()
        .context("malformed miner address")?;
    let hashes = block
        .transactions
        .iter()
        .map(|tx| {
            tx.hash
                .parse::<B256>()
                .with_context(|| format!("malformed transaction hash {:?}", tx.hash))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!(number, transactions = hashes.len(), "fetched block");

    // receipts and traces share one batch budget
    let ctx = ctx.clone().or_concurrency_limit(options.max_concurrency);
    let (receipts, traces) = tokio::join!(
        fetch_receipts(client, &hashes, options, &ctx),
        fetch_traces(client, &hashes, options, &ctx),
    );

    Ok(block
        .transactions
        .iter()
        .zip(receipts)
        .zip(traces)
        .map(|((tx, receipt), trace)| {
            let receipt = receipt.map_err(TransactionFailure::Receipt)?;
            let trace = trace.map_err(TransactionFailure::Trace)?;
            Ok(transaction_operations(tx, &receipt, miner, &trace, profile)?)
        })
        .inspect(|result| {
            if let Err(e) = result {
                warn!(number, "skipping transaction: {e}");
            }
        })
        .collect())
}
