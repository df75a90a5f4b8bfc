//! Process lifecycle helpers.

use tokio::signal;
use tracing::{error, info};

/// Resolve when the process is asked to stop (Ctrl+C or SIGTERM).
///
/// A signal source that cannot be installed is logged and then ignored, so
/// the server keeps serving and still stops on whichever source did install.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = tokio::select! {
        () = ctrl_c => "ctrl_c",
        () = terminate => "sigterm",
    };

    // In-flight requests drain; limiter and cache state is simply dropped
    info!(signal = source, "Shutdown requested, draining connections");
}
