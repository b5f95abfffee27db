use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use alloy::{
    rpc::{
        client::{ClientBuilder, RpcClient},
        json_rpc::{RequestPacket, ResponsePacket},
    },
    transports::TransportError,
};
use tower::{Layer, Service};
use tracing::warn;

/// Backoff never grows beyond this multiple of the base.
const MAX_BACKOFF_FACTOR: u32 = 10;

/// Re-send a packet that failed at the transport level.
///
/// Error objects inside a successful response are answers, not failures,
/// and are never retried.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    backoff: Duration,
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(backoff: Duration, max_retries: u32) -> Self {
        Self {
            backoff,
            max_retries,
        }
    }

    /// How long to wait before retry number `attempt`, counting from zero.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt)
            .unwrap_or(u32::MAX)
            .min(MAX_BACKOFF_FACTOR);
        self.backoff * factor
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// RetryLayer
#[derive(Clone, Debug)]
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            policy: self.policy,
        }
    }
}

/// RetryService
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> Service<RequestPacket> for RetryService<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Send
        + 'static
        + Clone,
    S::Future: Send + 'static,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let inner = self.inner.clone();
        let policy = self.policy;

        let mut inner = std::mem::replace(&mut self.inner, inner);
        Box::pin(async move {
            let mut res = inner.call(req.clone()).await;

            let mut attempt = 0;
            while let Err(e) = &res {
                if attempt >= policy.max_retries() {
                    break;
                }
                let backoff = policy.backoff(attempt);
                warn!(attempt = attempt + 1, ?backoff, "retrying after transport error: {e}");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                res = inner.call(req.clone()).await;
            }

            res
        })
    }
}

/// An HTTP JSON-RPC client that retries failed packets.
pub fn build_http_retry_client(rpc_url: url::Url, backoff: u64, max_retries: u32) -> RpcClient {
    let retry_policy = RetryLayer::new(RetryPolicy::new(
        Duration::from_millis(backoff),
        max_retries,
    ));
    ClientBuilder::default().layer(retry_policy).http(rpc_url)
}
