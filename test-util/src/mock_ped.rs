//! A scripted, in-process mock PED for end-to-end engine tests.
//!
//! Grounded on `ngenius_ped::transport::line`'s own `spawn_echo_server` test
//! helper (a bare `TcpListener` + one-read-per-command loop), generalized
//! from "echo whatever was sent" to "reply with the next entry from a
//! scripted list", so integration tests can pin the literal scenarios in
//! spec.md §8 (S1–S6) without a real PED.

use std::sync::{Arc, Mutex, PoisonError};

use ngenius_ped::Endpoint;
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

/// Handle to a running mock PED: the endpoint to connect a
/// [`ngenius_ped::LineTransport`]/[`ngenius_ped::PedSession`] to, and the
/// commands it has observed so far.
pub struct MockPed {
    /// Address the server is listening on.
    pub endpoint: Endpoint,
    commands: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl MockPed {
    /// Start a mock PED that performs the `connect()` handshake and then
    /// replies to each subsequent command with the next entry of `replies`,
    /// in order. Once `replies` is exhausted the connection is left open but
    /// no further replies are sent, so a caller relying on more replies than
    /// scripted will see its request time out rather than get a stray echo.
    pub async fn start(replies: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock PED listener");
        let addr = listener.local_addr().expect("mock PED local addr");
        let commands = Arc::new(Mutex::new(Vec::new()));
        let commands_for_task = Arc::clone(&commands);

        let handle = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else { return };
            let mut buf = vec![0u8; 16 * 1024];

            if read_line(&mut socket, &mut buf).await.is_none() {
                return;
            }
            if socket.write_all(b"{}\n").await.is_err() {
                return;
            }

            for reply in replies {
                let Some(line) = read_line(&mut socket, &mut buf).await else { break };
                commands_for_task.lock().unwrap_or_else(PoisonError::into_inner).push(line);

                let mut out = reply.into_bytes();
                out.push(b'\n');
                if socket.write_all(&out).await.is_err() {
                    break;
                }
            }
        });

        Self { endpoint: Endpoint::new(addr.ip().to_string(), addr.port()), commands, handle }
    }

    /// Commands received so far, in arrival order, with the handshake
    /// excluded.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Wait for the scripted reply list to be fully consumed (or the
    /// connection to close early).
    pub async fn join(self) { let _ = self.handle.await; }
}

async fn read_line(socket: &mut TcpStream, buf: &mut [u8]) -> Option<String> {
    let n = socket.read(buf).await.ok()?;
    if n == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&buf[..n]).trim_end().to_owned())
}
