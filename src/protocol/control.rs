//! Behavior, mode and direction control commands
//!
//! Control commands carry a single unsigned byte validated against a small
//! enumerated set, unlike settings which are range-checked. They live in
//! the id range 0x10..=0x12, above the settings table.

use crate::error::{Error, Result};

/// Wire id for behavior commands
pub const BEHAVIOR_ID: u8 = 0x10;
/// Wire id for mode commands
pub const MODE_ID: u8 = 0x11;
/// Wire id for direction commands
pub const DIRECTION_ID: u8 = 0x12;

/// High-level robot behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Behavior {
    /// Idle starting behavior
    InitialCard = 0,
    /// Search the field for the ball
    SearchForBallCard = 1,
    /// Search-and-carry behavior
    SacCard = 2,
    /// Go to the ball and pass to a teammate
    GoToBallPassToMateCard = 3,
}

impl Behavior {
    /// Look up a behavior by its operator-facing name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "InitialCard" => Ok(Behavior::InitialCard),
            "SearchForBallCard" => Ok(Behavior::SearchForBallCard),
            "SACCard" => Ok(Behavior::SacCard),
            "GoToBallPassToMateCard" => Ok(Behavior::GoToBallPassToMateCard),
            _ => Err(Error::UnknownBehavior(name.to_string())),
        }
    }

    /// Look up a behavior by its wire value
    pub fn from_value(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Behavior::InitialCard),
            1 => Ok(Behavior::SearchForBallCard),
            2 => Ok(Behavior::SacCard),
            3 => Ok(Behavior::GoToBallPassToMateCard),
            _ => Err(Error::InvalidChoice {
                command: "behavior",
                value,
            }),
        }
    }

    /// Operator-facing name
    pub fn name(self) -> &'static str {
        match self {
            Behavior::InitialCard => "InitialCard",
            Behavior::SearchForBallCard => "SearchForBallCard",
            Behavior::SacCard => "SACCard",
            Behavior::GoToBallPassToMateCard => "GoToBallPassToMateCard",
        }
    }
}

/// Control commands with enumerated value sets
///
/// Constructed only through the validating constructors, so
/// [`ControlCommand::encode`] is infallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Switch the active behavior
    Behavior(Behavior),
    /// Operating mode, valid values {0, 1}
    Mode(u8),
    /// Movement direction, valid values {0..=9}
    Direction(u8),
}

impl ControlCommand {
    /// Validate and build a mode command
    pub fn mode(value: u8) -> Result<Self> {
        if value > 1 {
            return Err(Error::InvalidChoice {
                command: "mode",
                value,
            });
        }
        Ok(ControlCommand::Mode(value))
    }

    /// Validate and build a direction command
    pub fn direction(value: u8) -> Result<Self> {
        if value > 9 {
            return Err(Error::InvalidChoice {
                command: "direction",
                value,
            });
        }
        Ok(ControlCommand::Direction(value))
    }

    /// Wire id byte
    pub fn cmd_id(&self) -> u8 {
        match self {
            ControlCommand::Behavior(_) => BEHAVIOR_ID,
            ControlCommand::Mode(_) => MODE_ID,
            ControlCommand::Direction(_) => DIRECTION_ID,
        }
    }

    /// Encode the command frame: `[id][value byte]`
    pub fn encode(&self) -> Vec<u8> {
        let value = match self {
            ControlCommand::Behavior(b) => *b as u8,
            ControlCommand::Mode(v) => *v,
            ControlCommand::Direction(v) => *v,
        };
        vec![self.cmd_id(), value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_names_round_trip() {
        for b in [
            Behavior::InitialCard,
            Behavior::SearchForBallCard,
            Behavior::SacCard,
            Behavior::GoToBallPassToMateCard,
        ] {
            assert_eq!(Behavior::from_name(b.name()).unwrap(), b);
            assert_eq!(Behavior::from_value(b as u8).unwrap(), b);
        }
    }

    #[test]
    fn test_behavior_unknown_name() {
        assert!(matches!(
            Behavior::from_name("DefendCard"),
            Err(Error::UnknownBehavior(_))
        ));
    }

    #[test]
    fn test_behavior_encode() {
        let frame = ControlCommand::Behavior(Behavior::SacCard).encode();
        assert_eq!(frame, [BEHAVIOR_ID, 0x02]);
    }

    #[test]
    fn test_mode_validation() {
        assert_eq!(ControlCommand::mode(1).unwrap().encode(), [MODE_ID, 0x01]);
        assert!(matches!(
            ControlCommand::mode(2),
            Err(Error::InvalidChoice {
                command: "mode",
                value: 2
            })
        ));
    }

    #[test]
    fn test_direction_validation() {
        assert_eq!(
            ControlCommand::direction(9).unwrap().encode(),
            [DIRECTION_ID, 0x09]
        );
        assert!(matches!(
            ControlCommand::direction(10),
            Err(Error::InvalidChoice {
                command: "direction",
                value: 10
            })
        ));
    }

    #[test]
    fn test_control_ids_above_settings_table() {
        use crate::protocol::settings::TABLE;
        for d in &TABLE {
            assert!(d.id < BEHAVIOR_ID);
        }
        assert_eq!(BEHAVIOR_ID, 0x10);
        assert_eq!(MODE_ID, 0x11);
        assert_eq!(DIRECTION_ID, 0x12);
    }
}
