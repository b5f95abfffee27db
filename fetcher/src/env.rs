use std::io;

use dotenvy::dotenv;
use tracing::warn;

/// Load the local `.env`, if any, into the process environment.
///
/// Any IO error is taken to mean there is no file.
pub fn load_dotenvy_vars_if_present() {
    match dotenv() {
        Ok(_) | Err(dotenvy::Error::Io(io::Error { .. })) => (),
        Err(e) => warn!("found a local `.env` file but could not parse it: {e}"),
    }
}
