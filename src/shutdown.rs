use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Install a handler that listens for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled when either signal is
/// received. The media server stops a transcode by signalling the process,
/// so the token is what ends a wait early.
///
/// # Errors
///
/// Returns an error if a signal stream cannot be registered.
pub fn install_shutdown_handler() -> std::io::Result<CancellationToken> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, stopping transcode");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, stopping transcode");
            }
        }

        token_clone.cancel();
    });

    Ok(token)
}
