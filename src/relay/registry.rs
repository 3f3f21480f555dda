//! Thread-safe registry of live robot connections
//!
//! The registry holds the write side of every accepted connection, keyed
//! by peer address. Membership mutation and broadcast iteration share one
//! mutex, so a broadcast never sees a half-updated peer set and no
//! add/remove races an iteration mid-flight.
//!
//! A connection present in the registry is writable-or-failing: the first
//! failed write removes and closes it, and delivery continues for the
//! remaining peers. A single bad robot never blocks the rest of the fleet.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream};

/// Write side of one robot connection
///
/// The read side stays with the connection handler; the registry only
/// ever writes and closes.
pub trait PeerLink: Send {
    /// Write the whole payload
    fn send(&mut self, payload: &[u8]) -> std::io::Result<()>;

    /// Close the connection (both directions)
    fn close(&mut self);
}

impl PeerLink for TcpStream {
    fn send(&mut self, payload: &[u8]) -> std::io::Result<()> {
        self.write_all(payload)
    }

    fn close(&mut self) {
        let _ = self.shutdown(Shutdown::Both);
    }
}

/// Synchronized map of live connections keyed by peer address
pub struct ConnectionRegistry {
    peers: Mutex<HashMap<SocketAddr, Box<dyn PeerLink>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection's write side
    pub fn add(&self, addr: SocketAddr, link: Box<dyn PeerLink>) -> Result<()> {
        let mut peers = self.peers.lock();
        if peers.contains_key(&addr) {
            return Err(Error::DuplicateConnection(addr));
        }
        peers.insert(addr, link);
        Ok(())
    }

    /// Remove a connection; no error if absent
    pub fn remove(&self, addr: SocketAddr) {
        self.peers.lock().remove(&addr);
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    /// True when no connections are registered
    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }

    /// Addresses of all registered connections
    pub fn snapshot(&self) -> Vec<SocketAddr> {
        self.peers.lock().keys().copied().collect()
    }

    /// Send `payload` to every registered connection
    ///
    /// Returns the number of successful deliveries. Peers whose write
    /// fails are removed and closed.
    pub fn broadcast(&self, payload: &[u8]) -> usize {
        self.broadcast_filtered(payload, None)
    }

    /// Send `payload` to every registered connection except `source`
    pub fn broadcast_except(&self, source: SocketAddr, payload: &[u8]) -> usize {
        self.broadcast_filtered(payload, Some(source))
    }

    fn broadcast_filtered(&self, payload: &[u8], skip: Option<SocketAddr>) -> usize {
        let mut peers = self.peers.lock();
        let mut delivered = 0;
        let mut dropped: Vec<SocketAddr> = Vec::new();

        for (addr, link) in peers.iter_mut() {
            if Some(*addr) == skip {
                continue;
            }
            match link.send(payload) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    log::warn!("Dropping robot at {}: write failed: {}", addr, e);
                    dropped.push(*addr);
                }
            }
        }

        for addr in dropped {
            if let Some(mut link) = peers.remove(&addr) {
                link.close();
            }
        }

        delivered
    }

    /// Close and remove every connection (listener stop path)
    pub fn close_all(&self) {
        let mut peers = self.peers.lock();
        for (addr, link) in peers.iter_mut() {
            log::debug!("Closing connection to {}", addr);
            link.close();
        }
        peers.clear();
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MockLink;
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_add_remove_snapshot() {
        let registry = ConnectionRegistry::new();
        assert!(registry.is_empty());

        registry.add(addr(7001), Box::new(MockLink::new())).unwrap();
        registry.add(addr(7002), Box::new(MockLink::new())).unwrap();
        assert_eq!(registry.len(), 2);

        let mut peers = registry.snapshot();
        peers.sort();
        assert_eq!(peers, vec![addr(7001), addr(7002)]);

        registry.remove(addr(7001));
        assert_eq!(registry.snapshot(), vec![addr(7002)]);

        // Idempotent removal
        registry.remove(addr(7001));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let registry = ConnectionRegistry::new();
        registry.add(addr(7001), Box::new(MockLink::new())).unwrap();

        match registry.add(addr(7001), Box::new(MockLink::new())) {
            Err(Error::DuplicateConnection(a)) => assert_eq!(a, addr(7001)),
            other => panic!("expected DuplicateConnection, got {:?}", other.err()),
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_broadcast_delivers_to_all() {
        let registry = ConnectionRegistry::new();
        let links: Vec<MockLink> = (0..3).map(|_| MockLink::new()).collect();
        for (i, link) in links.iter().enumerate() {
            registry
                .add(addr(7001 + i as u16), Box::new(link.clone()))
                .unwrap();
        }

        let delivered = registry.broadcast(&[0x04, 0xFF, 0x03, 0x00, 0x00]);
        assert_eq!(delivered, 3);
        for link in &links {
            assert_eq!(link.written(), vec![0x04, 0xFF, 0x03, 0x00, 0x00]);
        }
    }

    #[test]
    fn test_broadcast_drops_only_failed_peer() {
        let registry = ConnectionRegistry::new();
        let good_a = MockLink::new();
        let bad = MockLink::new();
        let good_b = MockLink::new();
        bad.fail_writes();

        registry.add(addr(7001), Box::new(good_a.clone())).unwrap();
        registry.add(addr(7002), Box::new(bad.clone())).unwrap();
        registry.add(addr(7003), Box::new(good_b.clone())).unwrap();

        let delivered = registry.broadcast(b"ping");
        assert_eq!(delivered, 2);
        assert_eq!(registry.len(), 2);
        assert!(!registry.snapshot().contains(&addr(7002)));
        assert!(bad.is_closed());
        assert_eq!(good_a.written(), b"ping");
        assert_eq!(good_b.written(), b"ping");

        // The dropped peer stays gone on the next broadcast
        assert_eq!(registry.broadcast(b"pong"), 2);
    }

    #[test]
    fn test_broadcast_except_skips_source() {
        let registry = ConnectionRegistry::new();
        let source = MockLink::new();
        let other = MockLink::new();
        registry.add(addr(7001), Box::new(source.clone())).unwrap();
        registry.add(addr(7002), Box::new(other.clone())).unwrap();

        let delivered = registry.broadcast_except(addr(7001), b"relay");
        assert_eq!(delivered, 1);
        assert!(source.written().is_empty());
        assert_eq!(other.written(), b"relay");
    }

    #[test]
    fn test_close_all() {
        let registry = ConnectionRegistry::new();
        let links: Vec<MockLink> = (0..2).map(|_| MockLink::new()).collect();
        for (i, link) in links.iter().enumerate() {
            registry
                .add(addr(7001 + i as u16), Box::new(link.clone()))
                .unwrap();
        }

        registry.close_all();
        assert!(registry.is_empty());
        for link in &links {
            assert!(link.is_closed());
        }
    }
}
