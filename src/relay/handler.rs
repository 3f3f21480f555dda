//! Per-connection handler
//!
//! Each accepted robot connection runs on its own thread through the
//! states `Connecting → Registered → (Draining | Relaying) → Closed`.
//! Registration happens in the accept loop before the handler thread is
//! spawned; the handler owns the read side until disconnect.
//!
//! Reads use a short socket timeout so the listener's shutdown flag is
//! observed between chunks. A configurable idle timeout reclaims stalled
//! connections: expiry is a normal Closed transition, not an error.
//! Deregistration and close run on every exit path.

use crate::config::ListenerMode;
use crate::error::{Error, Result};
use crate::protocol::WireKind;
use crate::relay::registry::ConnectionRegistry;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Socket read timeout so shutdown flags are observed between chunks
const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Read chunk size
const READ_CHUNK: usize = 1024;

/// Handler for one robot connection
pub struct ConnectionHandler {
    addr: SocketAddr,
    mode: ListenerMode,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
    heartbeat_reply: Option<i32>,
    idle_timeout: Option<Duration>,
}

impl ConnectionHandler {
    /// Create a handler for an already-registered connection
    pub fn new(
        addr: SocketAddr,
        mode: ListenerMode,
        registry: Arc<ConnectionRegistry>,
        running: Arc<AtomicBool>,
        heartbeat_reply: Option<i32>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            addr,
            mode,
            registry,
            running,
            heartbeat_reply,
            idle_timeout,
        }
    }

    /// Run until the robot disconnects, errors, idles out, or the
    /// listener stops
    pub fn run(&self, mut stream: TcpStream) {
        log::info!("Connected to {}", self.addr);

        let result = self.read_loop(&mut stream);

        // Release is unconditional on every exit path
        self.registry.remove(self.addr);
        let _ = stream.shutdown(Shutdown::Both);

        match result {
            Ok(()) => log::info!("Disconnected from {}", self.addr),
            Err(e) => log::warn!("Connection to {} closed: {}", self.addr, e),
        }
    }

    fn read_loop(&self, stream: &mut TcpStream) -> Result<()> {
        if let Err(e) = stream.set_read_timeout(Some(POLL_TIMEOUT)) {
            log::warn!("Failed to set read timeout for {}: {}", self.addr, e);
        }

        let mut buf = [0u8; READ_CHUNK];
        let mut last_activity = Instant::now();

        loop {
            if !self.running.load(Ordering::Relaxed) {
                log::debug!("Listener stopping, closing {}", self.addr);
                return Ok(());
            }

            match stream.read(&mut buf) {
                // Peer closed its write side
                Ok(0) => return Ok(()),
                Ok(n) => {
                    last_activity = Instant::now();
                    self.handle_chunk(stream, &buf[..n])?;
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    if let Some(limit) = self.idle_timeout {
                        if last_activity.elapsed() >= limit {
                            log::info!(
                                "Closing idle connection {} (no traffic for {:?})",
                                self.addr,
                                limit
                            );
                            return Ok(());
                        }
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::UnexpectedEof
                        || e.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    return Ok(());
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn handle_chunk(&self, stream: &mut TcpStream, chunk: &[u8]) -> Result<()> {
        match self.mode {
            ListenerMode::Relay => {
                let delivered = self.registry.broadcast_except(self.addr, chunk);
                log::debug!(
                    "Relayed {} bytes from {} to {} robot(s)",
                    chunk.len(),
                    self.addr,
                    delivered
                );
            }
            ListenerMode::Command => {
                // Inbound bytes are heartbeats/no-ops. With a reply value
                // configured, a 4-byte little-endian frame is answered with
                // the fixed reply in the same encoding.
                match self.heartbeat_reply {
                    Some(reply) if chunk.len() >= 4 => {
                        if let Some(value) = WireKind::I32.decode(&chunk[..4]) {
                            log::debug!("Heartbeat {} from {}", value, self.addr);
                            let mut frame = Vec::with_capacity(WireKind::I32.width());
                            WireKind::I32.encode_into(reply as i64, &mut frame);
                            stream.write_all(&frame)?;
                        }
                    }
                    _ => {
                        log::trace!("Drained {} bytes from {}", chunk.len(), self.addr);
                    }
                }
            }
        }
        Ok(())
    }
}
