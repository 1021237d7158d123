use tokio_util::sync::CancellationToken;

/// Cancel `cancel` on the first SIGINT / SIGTERM (Ctrl-C elsewhere).
///
/// Returns without cancelling if the signal handlers cannot be installed;
/// the run then simply cannot be interrupted.
pub async fn wait_for_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                aw_warn!(sys, error = %e, "failed to listen for SIGTERM");
                return;
            }
        };
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    aw_warn!(sys, error = %e, "failed to listen for Ctrl-C");
                    return;
                }
                aw_warn!(sys, signal = "SIGINT", "received signal, aborting alert run");
            }
            _ = sigterm.recv() => {
                aw_warn!(sys, signal = "SIGTERM", "received signal, aborting alert run");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            aw_warn!(sys, error = %e, "failed to listen for Ctrl-C");
            return;
        }
        aw_warn!(sys, "received Ctrl-C, aborting alert run");
    }
    cancel.cancel();
}
