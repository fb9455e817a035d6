//! Client engine for driving a PIN-entry device through an NGPAS-style
//! acceptor gateway over a persistent, line-oriented TCP channel.
//!
//! Four components, in the order data flows through them: the
//! [`transport`] (C1) owns the socket and its reconnect/retry policy; the
//! [`frame`] parser (C2) normalizes a raw reply line into a [`value::Frame`];
//! [`session`] (C3) exposes the PED's command primitives plus the idle
//! predicate; and [`engine`] (C4) drives one transaction's full lifecycle on
//! top of those primitives.

#![cfg_attr(test, expect(clippy::unwrap_used, reason = "test code can panic"))]
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "test code with known bounds")
)]
#![cfg_attr(test, expect(clippy::shadow_reuse, reason = "test code shadowing"))]

pub mod backoff;
pub mod config;
pub mod engine;
pub mod frame;
pub mod logging;
pub mod result;
pub mod session;
pub mod source_id;
pub mod transport;
pub mod value;

pub use engine::TransactionEngine;
pub use result::ResultFrame;
pub use session::PedSession;
pub use transport::{Endpoint, LineTransport, TransportError};
pub use value::Frame;
