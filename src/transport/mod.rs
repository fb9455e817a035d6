//! Line Transport (C1): owns the TCP socket to the PED/NGPAS gateway.
//!
//! See [`line::LineTransport`] for the connect/retry/backoff implementation.
//! This module boundary mirrors `leynos-mxd::transport`, which splits the
//! "bespoke networking loop" into its own module separate from protocol
//! parsing.

mod line;

pub use line::{Endpoint, LineTransport, TransportError};
