//! Ctrl-C handling for a resolution run.

/// Resolves once Ctrl-C is received.
///
/// If the handler cannot be installed this yields `None`, so a
/// `Some(..) = interrupted()` branch of `select!` is disabled instead of
/// aborting the run.
pub async fn interrupted() -> Option<String> {
    interrupt_reason(tokio::signal::ctrl_c().await)
}

fn interrupt_reason(signal: std::io::Result<()>) -> Option<String> {
    match signal {
        Ok(()) => Some("received Ctrl-C".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Could not install the Ctrl-C handler");
            None
        }
    }
}
