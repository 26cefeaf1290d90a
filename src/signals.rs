//! # OS termination signals as a shutdown trigger.
//!
//! [`wait_for_shutdown_signal`] resolves when the process is asked to
//! terminate and reports which signal fired, so the controller can log the
//! trigger before flipping the cancellation token. A registration failure
//! is surfaced as `Err` and is **not** a termination request; the caller
//! keeps running and relies on [`ShutdownHandle`](crate::ShutdownHandle)
//! alone.

/// Waits for SIGINT, SIGTERM, or SIGQUIT and names the one that fired.
///
/// Listeners are registered per call; `Err` means registration failed and
/// no signal will ever be observed by this future.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let fired = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(fired)
}

/// Waits for Ctrl-C (the only portable termination request off unix).
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
