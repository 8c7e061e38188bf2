//! Command implementations.

pub mod doctor;
pub mod monitor;

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Token that fires on Ctrl+C so an in-flight request is abandoned.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the current request");
            trigger.cancel();
        }
    });
    token
}
