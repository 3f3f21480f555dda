//! Wire protocol for robot command frames
//!
//! # Frame format
//!
//! Every command is a single frame, no length prefix or terminator:
//!
//! ```text
//! ┌─────────────┬──────────────────────────┐
//! │ Id (1 byte) │ Value (1 or 4 bytes)     │
//! │             │ Little-endian            │
//! └─────────────┴──────────────────────────┘
//! ```
//!
//! The receiving robot dispatches on the id byte, so exactly one frame is
//! written per send.
//!
//! # Id space
//!
//! | Range       | Use                                   |
//! |-------------|---------------------------------------|
//! | 0x01..=0x0F | Camera settings ([`settings::TABLE`]) |
//! | 0x10..=0x12 | Behavior / mode / direction commands  |
//!
//! Batch setting updates are the one exception to the id-prefixed layout:
//! they pack all 15 values back to back in table order (39 bytes, no ids),
//! which is the layout the robot's bulk decoder expects.

pub mod control;
pub mod settings;

pub use control::{Behavior, ControlCommand};
pub use settings::{SettingDescriptor, WireKind};
