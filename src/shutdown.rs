use log::info;
use tokio_util::sync::CancellationToken;

/// Wires SIGINT and SIGTERM to the cancellation token.
///
/// The handler task only signals; the ingestion loop performs the actual
/// drain and close. Cancelling an already-cancelled token is a no-op, so
/// repeated signals do not restart the shutdown sequence.
///
/// Must be called from within a tokio runtime.
pub fn install_signal_handlers(cancel: CancellationToken) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = interrupt.recv() => {}
                    _ = terminate.recv() => {}
                }
                info!("shutdown signal received, cleaning up");
                cancel.cancel();
            }
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                info!("shutdown signal received, cleaning up");
                cancel.cancel();
            }
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_cancellation_is_idempotent() {
        let cancel = CancellationToken::new();
        install_signal_handlers(cancel.clone()).unwrap();

        cancel.cancel();
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
