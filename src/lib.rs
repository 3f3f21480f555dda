//! SetuRelay - command relay daemon for robot fleets
//!
//! SetuRelay accepts TCP connections from robots, tracks them in a
//! synchronized connection registry, and broadcasts validated binary
//! command frames to every live connection.
//!
//! ## Listener modes
//!
//! - **Command**: robots send heartbeats/no-ops inbound; operators push
//!   setting and behavior frames outbound through a [`Dispatcher`]
//! - **Relay**: bytes from one robot are rebroadcast to all other robots
//!
//! ## Typical embedding
//!
//! ```no_run
//! use setu_relay::{Config, Dispatcher, RelayServer};
//!
//! let config = Config::defaults();
//! let server = RelayServer::new(config.listeners[0].clone());
//! server.start()?;
//!
//! let dispatcher = Dispatcher::new(server.registry());
//! dispatcher.apply_setting("gain", 512)?;
//! # Ok::<(), setu_relay::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod relay;

// Re-export commonly used types
pub use config::{Config, ListenerConfig, ListenerMode};
pub use error::{Error, Result};
pub use protocol::{Behavior, ControlCommand};
pub use relay::{ConnectionRegistry, Dispatcher, RelayServer, StartStatus};
