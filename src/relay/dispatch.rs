//! Command dispatch: validate, encode, broadcast
//!
//! The dispatcher is the single entry point for operator requests. Every
//! request follows the same contract: look up, validate, encode, then
//! broadcast through the registry. Validation failures return before any
//! network I/O; delivery is best-effort and the delivered count is the
//! only signal of partial failure.

use crate::error::{Error, Result};
use crate::protocol::control::{Behavior, ControlCommand};
use crate::protocol::settings;
use crate::relay::registry::ConnectionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Encodes operator requests and broadcasts them to the live connection set
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over one listener's registry
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Update one named setting on every connected robot
    ///
    /// Returns the number of robots the frame was delivered to.
    pub fn apply_setting(&self, name: &str, value: i64) -> Result<usize> {
        let descriptor =
            settings::find(name).ok_or_else(|| Error::UnknownSetting(name.to_string()))?;
        let frame = descriptor.encode(value)?;
        let delivered = self.registry.broadcast(&frame);
        log::info!("Sent {} = {} to {} robot(s)", name, value, delivered);
        Ok(delivered)
    }

    /// Update all settings at once
    ///
    /// Values are matched positionally against the descriptor table; one
    /// out-of-range value rejects the whole batch and nothing is sent.
    pub fn apply_batch(&self, values: &[i64]) -> Result<usize> {
        let frame = settings::encode_batch(values)?;
        let delivered = self.registry.broadcast(&frame);
        log::info!(
            "Sent batch update ({} bytes) to {} robot(s)",
            frame.len(),
            delivered
        );
        Ok(delivered)
    }

    /// Switch the active behavior on every connected robot
    pub fn set_behavior(&self, behavior: Behavior) -> Result<usize> {
        self.send_control(ControlCommand::Behavior(behavior))
    }

    /// Set the operating mode; valid values are 0 and 1
    pub fn set_mode(&self, mode: u8) -> Result<usize> {
        self.send_control(ControlCommand::mode(mode)?)
    }

    /// Set the movement direction; valid values are 0 through 9
    pub fn set_direction(&self, direction: u8) -> Result<usize> {
        self.send_control(ControlCommand::direction(direction)?)
    }

    fn send_control(&self, command: ControlCommand) -> Result<usize> {
        let frame = command.encode();
        let delivered = self.registry.broadcast(&frame);
        log::info!("Sent {:?} to {} robot(s)", command, delivered);
        Ok(delivered)
    }

    /// Peer addresses currently registered, for status reporting
    pub fn peers(&self) -> Vec<SocketAddr> {
        self.registry.snapshot()
    }
}
