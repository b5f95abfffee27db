use tracing_subscriber::{
    prelude::*,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Install the global subscriber, filtered by `RUST_LOG`.
///
/// # Panics
/// If a global subscriber is already set.
pub fn init() {
    subscriber().init();
}

/// Like [`init`], but fails instead of panicking.
pub fn try_init() -> Result<(), TryInitError> {
    subscriber().try_init()
}

fn subscriber() -> impl SubscriberInitExt {
    tracing_subscriber::Registry::default().with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_filter(EnvFilter::from_default_env()),
    )
}
