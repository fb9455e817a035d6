//! Host-assigned correlation identifiers (spec.md §6).
//!
//! A `sourceId` is a 15-character monotonic string derived from
//! `yyyyMMddHHmmssfff` (UTC, truncated). The engine treats it as an opaque
//! correlation token it never generates business meaning from; the host is
//! responsible for persisting the most recent value for crash recovery
//! (see [`crate::session::PedSession::check_last_transaction_result`]).

use chrono::{DateTime, Utc};

/// Length of a generated `sourceId` in bytes (ASCII digits only).
pub const SOURCE_ID_LEN: usize = 15;

/// Generate a `sourceId` from the given instant.
///
/// Format is `yyyyMMddHHmmssfff`, truncated to [`SOURCE_ID_LEN`] characters
/// (dropping the least-significant digit of milliseconds) so that a strictly
/// increasing clock yields a strictly increasing, fixed-width string.
#[must_use]
pub fn generate_at(now: DateTime<Utc>) -> String {
    let full = now.format("%Y%m%d%H%M%S%3f").to_string();
    full.chars().take(SOURCE_ID_LEN).collect()
}

/// Generate a `sourceId` from the current wall-clock time.
#[must_use]
pub fn generate() -> String { generate_at(Utc::now()) }

/// The literal correlation id used for an X report flow (spec.md §6).
pub const X_REPORT_SOURCE_ID: &str = "XReport";
/// The literal correlation id used for a Z report flow (spec.md §6).
pub const Z_REPORT_SOURCE_ID: &str = "ZReport";
