//utils for graceful shutdown that can be used from
//any module in the project
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A token that is cancelled once the process receives Ctrl-C.
///
/// Must be called from inside a tokio runtime.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let tc = token.clone();
    //spawn once to listen for ctrl-c
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("received ctrl-c, shutting down");
                tc.cancel();
            }
            Err(e) => error!(error = %e, "failed to install ctrl-c handler"),
        }
    });
    token
}
