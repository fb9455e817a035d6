//! Process-wide observability.
//!
//! spec.md §9 describes "a process-wide append-only log file" as a side
//! effect the original implementation hard-wired; here it is an injectable
//! sink built from `tracing` + a non-blocking `tracing-appender` rolling
//! file writer, so callers can install their own subscriber instead if the
//! host process already has one. The teacher itself only ever logs to
//! stdout/stderr (`tracing_subscriber::fmt` with no file layer); the file
//! sink idiom is taken from `rowan-sl-hayselnut/haysel`, which depends on
//! `tracing-appender` for exactly this purpose.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

/// Default log file name (spec.md §6).
pub const DEFAULT_LOG_FILE: &str = "ngenius.log";

/// Install a global `tracing` subscriber that writes to `path`.
///
/// Returns a [`WorkerGuard`] that must be kept alive for the duration of the
/// process; dropping it flushes and stops the background writer thread.
///
/// # Errors
/// Returns an error if a global subscriber has already been installed.
pub fn init_file_logging(path: &Path) -> Result<WorkerGuard, tracing::subscriber::SetGlobalDefaultError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().map_or_else(|| DEFAULT_LOG_FILE.to_owned(), |n| n.to_string_lossy().into_owned());
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}

/// Log an outbound wire command (spec.md §4.1: "Every send logs `SEND: <line>`").
pub fn log_send(line: &str) {
    tracing::info!(target: "ngpas::wire", "SEND: {line}");
}

/// Log an inbound wire reply (spec.md §4.1: "every reply logs `RECV: <payload>`").
///
/// Replies whose raw text contains the substring `error` additionally log an
/// `ERROR:` line, per spec.md §4.1.
pub fn log_recv(payload: &str) {
    tracing::info!(target: "ngpas::wire", "RECV: {payload}");
    if payload.contains("error") {
        tracing::warn!(target: "ngpas::wire", "ERROR: {payload}");
    }
}
