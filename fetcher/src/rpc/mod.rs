//! Batched JSON-RPC retrieval.
//!
//! Requests are split into chunks of [`FetchOptions::chunk_size`], each sent
//! as one JSON-RPC batch, with at most [`FetchOptions::max_concurrency`]
//! batches in flight. Results always come back in request order, one per
//! request.

use std::{sync::Arc, time::Duration};

use alloy::{
    primitives::B256,
    rpc::{
        client::RpcClient,
        json_rpc::{RpcError, RpcSend},
    },
    transports::{TransportErrorKind, TransportResult},
};
use futures::{future::join_all, stream, StreamExt as _};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::{sync::Semaphore, time::Instant};
use tokio_util::sync::CancellationToken;
use trace_ops::{wire::Receipt, TraceFrame};
use tracing::{error, info, info_span, Instrument as _};

pub mod retry;

/// Outcome of one request, when it is not a value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The whole batch failed, after retries. Shared by every request in it.
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered this request with an error object.
    #[error("node error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The node answered with something we could not make sense of.
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("cancelled")]
    Cancelled,
}

/// Knobs for [`fetch_batch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Requests per JSON-RPC batch.
    pub chunk_size: usize,
    /// Batches in flight at once.
    pub max_concurrency: usize,
    /// Give up on a single batch after this long.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            max_concurrency: 8,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Cancellation signal, optional deadline and optional shared batch budget
/// for a fetch.
///
/// Cloning is cheap; all clones observe the same cancellation and draw from
/// the same budget.
#[derive(Clone, Debug, Default)]
pub struct FetchContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    permits: Option<Arc<Semaphore>>,
}

impl FetchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            permits: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// At most `limit` batches in flight across every fetch sharing this
    /// context, on top of each fetch's own [`FetchOptions::max_concurrency`].
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.permits = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    /// [`Self::with_concurrency_limit`], unless a budget is already shared.
    pub fn or_concurrency_limit(self, limit: usize) -> Self {
        match self.permits {
            Some(_) => self,
            None => self.with_concurrency_limit(limit),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|it| Instant::now() >= it)
    }

    /// Resolves once cancelled or past the deadline.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {}
            },
            None => self.token.cancelled().await,
        }
    }
}

/// Call `method` once per element of `params`, and `decode` each result.
///
/// The output is aligned with `params`. A batch that fails as a whole
/// reports the same [`FetchError::Transport`] for each of its requests; a
/// result that does not `decode` affects only its own slot. Once `ctx` is
/// done, in-flight batches are dropped, no new ones are sent, and every slot
/// without a result is [`FetchError::Cancelled`].
pub async fn fetch_batch<P, T, F>(
    client: &RpcClient,
    method: &'static str,
    params: &[P],
    decode: F,
    options: &FetchOptions,
    ctx: &FetchContext,
) -> Vec<Result<T, FetchError>>
where
    P: RpcSend,
    F: Fn(Value) -> Result<T, String>,
{
    let chunk_size = options.chunk_size.max(1);
    let mut slots = params.iter().map(|_| None).collect::<Vec<_>>();

    let mut calls = stream::iter(params.chunks(chunk_size).enumerate())
        .map(|(ix, chunk)| {
            let span = info_span!("chunk", method, chunk = ix, size = chunk.len());
            async move {
                // the semaphore is never closed
                let _permit = match &ctx.permits {
                    Some(permits) => permits.acquire().await.ok(),
                    None => None,
                };
                (ix * chunk_size, send_chunk(client, method, chunk, options.timeout).await)
            }
            .instrument(span)
        })
        .buffer_unordered(options.max_concurrency.max(1));

    loop {
        tokio::select! {
            biased;
            _ = ctx.done() => {
                let pending = slots.iter().filter(|it| it.is_none()).count();
                info!(method, pending, "fetch cancelled");
                break;
            }
            next = calls.next() => match next {
                Some((offset, Ok(results))) => {
                    for (ix, result) in results.into_iter().enumerate() {
                        slots[offset + ix] = Some(entry(result, &decode));
                    }
                }
                Some((offset, Err(e))) => {
                    let len = chunk_size.min(params.len() - offset);
                    error!(method, offset, len, "batch failed: {e}");
                    let message = e.to_string();
                    for slot in &mut slots[offset..offset + len] {
                        *slot = Some(Err(FetchError::Transport(message.clone())));
                    }
                }
                None => break,
            }
        }
    }
    drop(calls);

    slots
        .into_iter()
        .map(|it| it.unwrap_or(Err(FetchError::Cancelled)))
        .collect()
}

/// One JSON-RPC batch. The outer error means no entry has a result.
async fn send_chunk<P: RpcSend>(
    client: &RpcClient,
    method: &'static str,
    params: &[P],
    timeout: Option<Duration>,
) -> TransportResult<Vec<TransportResult<Value>>> {
    let mut batch = client.new_batch();
    let waiters = params
        .iter()
        .map(|it| batch.add_call::<_, Value>(method, it))
        .collect::<Result<Vec<_>, _>>()?;

    let sent = batch.send();
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, sent).await.map_err(|_| {
            TransportErrorKind::custom_str(&format!(
                "batch timed out after {timeout:?}"
            ))
        })??,
        None => sent.await?,
    }
    Ok(join_all(waiters).await)
}

fn entry<T>(
    result: TransportResult<Value>,
    decode: impl Fn(Value) -> Result<T, String>,
) -> Result<T, FetchError> {
    match result {
        Ok(value) => decode(value).map_err(FetchError::Decode),
        Err(RpcError::ErrorResp(payload)) => Err(FetchError::Rpc {
            code: payload.code,
            message: payload.message.into_owned(),
        }),
        Err(other @ RpcError::DeserError { .. }) => Err(FetchError::Decode(other.to_string())),
        Err(other) => Err(FetchError::Transport(other.to_string())),
    }
}

/// Deserialize with the JSON path of the failure in the message.
pub fn decode_json<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_path_to_error::deserialize(value).map_err(|e| e.to_string())
}

/// `debug_traceTransaction` for each hash.
pub async fn fetch_traces(
    client: &RpcClient,
    hashes: &[B256],
    options: &FetchOptions,
    ctx: &FetchContext,
) -> Vec<Result<TraceFrame, FetchError>> {
    let tracer = json!({
        "disableMemory": true,
        "disableStack": true,
        "disableStorage": true,
    });
    let params = hashes
        .iter()
        .map(|hash| (*hash, tracer.clone()))
        .collect::<Vec<_>>();
    fetch_batch(
        client,
        "debug_traceTransaction",
        &params,
        |value| TraceFrame::from_json(value).map_err(|e| e.to_string()),
        options,
        ctx,
    )
    .await
}

/// `eth_getTransactionReceipt` for each hash.
pub async fn fetch_receipts(
    client: &RpcClient,
    hashes: &[B256],
    options: &FetchOptions,
    ctx: &FetchContext,
) -> Vec<Result<Receipt, FetchError>> {
    let params = hashes.iter().map(|hash| (*hash,)).collect::<Vec<_>>();
    fetch_batch(
        client,
        "eth_getTransactionReceipt",
        &params,
        |value| match value {
            Value::Null => Err("no receipt for transaction".to_owned()),
            other => decode_json(other),
        },
        options,
        ctx,
    )
    .await
}
