//! TCP line transport: one command per write, one frame per read.
//!
//! Grounded on `leynos-mxd/src/transport/legacy.rs` for the
//! `tokio::net::TcpStream` + `thiserror`-error-enum shape (inverted here
//! into a client `connect()` loop rather than a server `accept()` loop) and
//! on `leynos-mxd/src/transaction/frame.rs`'s `io_with_timeout` idiom for
//! bounding individual reads.

use std::io;

use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::sleep,
};

use crate::{backoff, config::TransportConfig, logging};

/// An immutable `(host, port)` pair identifying the PED/NGPAS gateway.
///
/// Created once per session and owned by the [`crate::session::PedSession`];
/// host/port *sourcing* (env, config file, CLI) is the caller's concern
/// (spec.md §1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Build an endpoint from an already-resolved host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// The gateway hostname or address.
    #[must_use]
    pub fn host(&self) -> &str { &self.host }

    /// The gateway TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Errors raised by the line transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A socket or I/O failure occurred; retryable.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An operation was attempted on a connection that is not open;
    /// retryable (the caller should reconnect and retry).
    #[error("connection not open")]
    NotConnected,
    /// `connect` exhausted all configured attempts.
    #[error("connect exhausted after {attempts} attempt(s): {cause}")]
    ConnectExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last underlying failure.
        #[source]
        cause: Box<TransportError>,
    },
    /// `send_and_recv` exhausted all configured attempts.
    #[error("send exhausted after {attempts} attempt(s): {cause}")]
    SendExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last underlying failure.
        #[source]
        cause: Box<TransportError>,
    },
}

impl TransportError {
    /// Network-class failures are retried by both `connect` and
    /// `send_and_recv`; `ConnectExhausted`/`SendExhausted` are terminal and
    /// must propagate immediately instead of being retried again.
    const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::NotConnected)
    }
}

/// Owns the TCP socket to the gateway. Not `Clone`/`Sync`-shareable by
/// design (spec.md §5, §9): a single owner enforces the half-duplex,
/// one-command-in-flight protocol invariant without locks.
pub struct LineTransport {
    endpoint: Endpoint,
    config: TransportConfig,
    stream: Option<TcpStream>,
}

impl LineTransport {
    /// Create a transport for `endpoint`. The socket is not opened until
    /// [`Self::connect`] (or the first [`Self::send_and_recv`]) is called.
    #[must_use]
    pub const fn new(endpoint: Endpoint, config: TransportConfig) -> Self {
        Self { endpoint, config, stream: None }
    }

    /// `true` if the connection is currently open.
    #[must_use]
    pub const fn is_open(&self) -> bool { self.stream.is_some() }

    /// (Re)establish the TCP connection and perform the `connect()`
    /// handshake. No-op if already open.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectExhausted`] after
    /// `config.max_connect_attempts` failed attempts.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.is_open() {
            return Ok(());
        }

        let mut last_err = None;
        for attempt in 1..=self.config.max_connect_attempts {
            match self.try_connect_once().await {
                Ok(stream) => {
                    self.stream = Some(stream);
                    tracing::info!(attempt, endpoint = %self.endpoint, "ped connected");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(attempt, endpoint = %self.endpoint, error = %e, "ped connect attempt failed");
                    let retry = attempt < self.config.max_connect_attempts;
                    last_err = Some(e);
                    if retry {
                        sleep(backoff::exponential(attempt, self.config.base_backoff, self.config.max_backoff)).await;
                    }
                }
            }
        }

        // `last_err` is always populated: the loop body always assigns it on
        // failure, and a success path returns early above.
        let cause = last_err.unwrap_or(TransportError::NotConnected);
        Err(TransportError::ConnectExhausted { attempts: self.config.max_connect_attempts, cause: Box::new(cause) })
    }

    async fn try_connect_once(&self) -> Result<TcpStream, TransportError> {
        let mut stream = TcpStream::connect((self.endpoint.host(), self.endpoint.port())).await?;
        let handshake = b"connect()\n";
        stream.write_all(handshake).await?;
        let mut discard = vec![0u8; self.config.recv_buffer_size];
        let _ = stream.read(&mut discard).await?;
        Ok(stream)
    }

    /// Best-effort teardown; never raises.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!(endpoint = %self.endpoint, "ped disconnected");
        }
    }

    /// Send `line` (a newline is appended) and return the decoded reply.
    ///
    /// Retries up to `config.max_send_attempts` times on network-class
    /// failures, force-disconnecting between attempts so the next attempt
    /// re-establishes the connection, with linear backoff
    /// `base_backoff * attempt`.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectExhausted`] if reconnecting fails, or
    /// [`TransportError::SendExhausted`] after retries are spent.
    pub async fn send_and_recv(&mut self, line: &str) -> Result<String, TransportError> {
        let mut last_err = None;
        for attempt in 1..=self.config.max_send_attempts {
            match self.send_and_recv_once(line).await {
                Ok(reply) => return Ok(reply),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "send_and_recv attempt failed");
                    self.disconnect();
                    let retry = attempt < self.config.max_send_attempts;
                    last_err = Some(e);
                    if retry {
                        sleep(backoff::linear(attempt, self.config.base_backoff)).await;
                    }
                }
            }
        }

        let cause = last_err.unwrap_or(TransportError::NotConnected);
        Err(TransportError::SendExhausted { attempts: self.config.max_send_attempts, cause: Box::new(cause) })
    }

    async fn send_and_recv_once(&mut self, line: &str) -> Result<String, TransportError> {
        self.connect().await?;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        logging::log_send(line);
        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
        stream.write_all(&out).await?;

        let mut buf = vec![0u8; self.config.recv_buffer_size];
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(TransportError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "ped closed connection")));
        }
        let reply = String::from_utf8_lossy(&buf[..n]).into_owned();
        logging::log_recv(&reply);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::AsyncWriteExt as _,
        net::TcpListener,
    };

    use super::*;

    async fn spawn_echo_server() -> (Endpoint, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                // handshake
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(b"{}\n").await;
                loop {
                    let n = match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    if socket.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
            }
        });
        (Endpoint::new(addr.ip().to_string(), addr.port()), handle)
    }

    #[tokio::test]
    async fn connect_then_send_and_recv_round_trips() {
        let (endpoint, _server) = spawn_echo_server().await;
        let mut transport = LineTransport::new(endpoint, TransportConfig::default());
        transport.connect().await.expect("connect");
        assert!(transport.is_open());
        let reply = transport.send_and_recv("getStatus()").await.expect("send");
        assert!(reply.contains("getStatus()"));
    }

    #[tokio::test]
    async fn connect_to_closed_port_exhausts_with_backoff() {
        let mut cfg = TransportConfig::default();
        cfg.base_backoff = Duration::from_millis(5);
        cfg.max_backoff = Duration::from_millis(20);
        let mut transport = LineTransport::new(Endpoint::new("127.0.0.1", 1), cfg);
        let err = transport.connect().await.expect_err("should exhaust");
        assert!(matches!(err, TransportError::ConnectExhausted { attempts: 3, .. }));
    }
}
