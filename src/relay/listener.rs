//! TCP listener lifecycle and accept loop
//!
//! One [`RelayServer`] owns one listening socket, its connection registry
//! and its accept thread. The accept loop runs non-blocking with a short
//! sleep so the shutdown flag is observed promptly; each accepted
//! connection is registered and handed to a named handler thread without
//! blocking further accepts.

use crate::config::ListenerConfig;
use crate::error::{Error, Result};
use crate::relay::handler::ConnectionHandler;
use crate::relay::registry::ConnectionRegistry;
use parking_lot::Mutex;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Outcome of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    /// Listener bound and accept loop spawned
    Started,
    /// Listener was already running; nothing was rebound
    AlreadyRunning,
}

/// Accept pause when no connection is pending
const ACCEPT_IDLE: Duration = Duration::from_millis(10);

/// One TCP listener: lifecycle state, accept loop and connection registry
pub struct RelayServer {
    config: ListenerConfig,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl RelayServer {
    /// Create a stopped server for one configured listener
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            running: Arc::new(AtomicBool::new(false)),
            accept_thread: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Shared connection registry; dispatchers broadcast through it
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Address actually bound, available while running (useful with an
    /// ephemeral port in the bind address)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// True while the accept loop is live
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Bind the listener and spawn the accept loop
    ///
    /// Idempotent: a running listener reports [`StartStatus::AlreadyRunning`]
    /// without rebinding. A bind failure is fatal for this listener only.
    pub fn start(&self) -> Result<StartStatus> {
        if self.running.swap(true, Ordering::SeqCst) {
            log::info!("Listener '{}' already running", self.config.name);
            return Ok(StartStatus::AlreadyRunning);
        }

        let listener = match TcpListener::bind(&self.config.bind) {
            Ok(listener) => listener,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(Error::Bind {
                    addr: self.config.bind.clone(),
                    source: e,
                });
            }
        };
        if let Err(e) = listener.set_nonblocking(true) {
            self.running.store(false, Ordering::SeqCst);
            return Err(Error::Io(e));
        }

        let bound = listener.local_addr().ok();
        *self.local_addr.lock() = bound;

        log::info!(
            "Listener '{}' ({:?} mode) on {}",
            self.config.name,
            self.config.mode,
            bound.map_or_else(|| self.config.bind.clone(), |a| a.to_string())
        );

        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name(format!("accept-{}", self.config.name))
            .spawn(move || accept_loop(listener, config, registry, running))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                Error::Io(e)
            })?;
        *self.accept_thread.lock() = Some(handle);

        Ok(StartStatus::Started)
    }

    /// Stop accepting, close every live connection, join the accept loop
    ///
    /// Idempotent: stopping a stopped listener changes nothing.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        // Tear down live connections first; handlers observe the cleared
        // flag or the closed socket and deregister themselves.
        self.registry.close_all();

        if let Some(handle) = self.accept_thread.lock().take() {
            let _ = handle.join();
        }
        *self.local_addr.lock() = None;

        log::info!("Listener '{}' stopped", self.config.name);
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    config: ListenerConfig,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
) {
    log::debug!("Accept loop for '{}' started", config.name);

    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                // Handlers use blocking reads with a short timeout
                if let Err(e) = stream.set_nonblocking(false) {
                    log::error!("Failed to set blocking mode for {}: {}", addr, e);
                    continue;
                }

                let writer = match stream.try_clone() {
                    Ok(writer) => writer,
                    Err(e) => {
                        log::error!("Failed to clone stream for {}: {}", addr, e);
                        continue;
                    }
                };
                if let Err(e) = registry.add(addr, Box::new(writer)) {
                    log::error!("Rejecting {}: {}", addr, e);
                    continue;
                }

                let handler = ConnectionHandler::new(
                    addr,
                    config.mode,
                    Arc::clone(&registry),
                    Arc::clone(&running),
                    config.heartbeat_reply,
                    config.idle_timeout(),
                );
                let spawned = thread::Builder::new()
                    .name(format!("conn-{}", addr))
                    .spawn(move || handler.run(stream));
                if let Err(e) = spawned {
                    log::error!("Failed to spawn handler for {}: {}", addr, e);
                    registry.remove(addr);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_IDLE);
            }
            Err(e) => {
                log::error!("Accept error on '{}': {}", config.name, e);
            }
        }
    }

    log::debug!("Accept loop for '{}' stopped", config.name);
}
