//! Tunable-but-defaulted constants (spec.md §6).
//!
//! Configuration *sourcing* — where a host/port/MID/TID actually come from —
//! is an explicit external-collaborator concern (spec.md §1); this crate
//! never reads environment variables or files for it. What it does own is a
//! small set of engineering constants with literal defaults, mirroring the
//! teacher's `AppConfig` (`src/main.rs`) default-value style without the
//! CLI/env-merging machinery that would duplicate the host's config layer.

use std::time::Duration;

/// Bounds and backoff parameters for the line transport (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Maximum TCP (re)connect attempts before `ConnectExhausted`.
    pub max_connect_attempts: u32,
    /// Maximum `send_and_recv` attempts before `SendExhausted`.
    pub max_send_attempts: u32,
    /// Base delay for both connect (exponential) and send (linear) backoff.
    pub base_backoff: Duration,
    /// Ceiling applied to the connect backoff's exponential growth.
    pub max_backoff: Duration,
    /// Maximum single-read buffer size; the protocol delivers one frame per
    /// read and the transport never reassembles.
    pub recv_buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connect_attempts: 3,
            max_send_attempts: 3,
            base_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(30_000),
            recv_buffer_size: 16 * 1024,
        }
    }
}

/// Timing parameters for the transaction engine (C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Interval between poll-loop `getStatus` calls.
    pub poll_interval: Duration,
    /// Phase deadline before any `updateTransaction` has been sent.
    pub base_timeout: Duration,
    /// Phase deadline once an `updateTransaction` has been sent.
    pub extended_timeout: Duration,
    /// Safety threshold checked immediately after sending an
    /// `updateTransaction`, tighter than `extended_timeout` (spec.md §9,
    /// "open question — 90s vs 150s"). Preserved literally rather than
    /// reconciled with `extended_timeout`.
    pub pre_update_safety_timeout: Duration,
    /// Fixed sleep while waiting for the PED to become idle.
    pub idle_gate_sleep: Duration,
    /// Fixed sleep on a "Command timed out" (error 101) status.
    pub command_timeout_backoff: Duration,
}

impl EngineConfig {
    /// Defaults used for authorize/refund/void transactions.
    #[must_use]
    pub const fn transaction_defaults() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            base_timeout: Duration::from_secs(120),
            extended_timeout: Duration::from_secs(150),
            pre_update_safety_timeout: Duration::from_secs(90),
            idle_gate_sleep: Duration::from_secs(3),
            command_timeout_backoff: Duration::from_secs(15),
        }
    }

    /// Defaults used for X/Z report flows (`base_timeout` shortened to 60s).
    #[must_use]
    pub const fn report_defaults() -> Self {
        Self {
            base_timeout: Duration::from_secs(60),
            ..Self::transaction_defaults()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self { Self::transaction_defaults() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_defaults_match_spec() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.max_connect_attempts, 3);
        assert_eq!(cfg.max_send_attempts, 3);
        assert_eq!(cfg.base_backoff, Duration::from_millis(1000));
        assert_eq!(cfg.max_backoff, Duration::from_millis(30_000));
        assert_eq!(cfg.recv_buffer_size, 16 * 1024);
    }

    #[test]
    fn report_defaults_shorten_base_timeout_only() {
        let tx = EngineConfig::transaction_defaults();
        let report = EngineConfig::report_defaults();
        assert_eq!(report.base_timeout, Duration::from_secs(60));
        assert_eq!(report.poll_interval, tx.poll_interval);
        assert_eq!(report.extended_timeout, tx.extended_timeout);
    }
}
