//! Camera setting descriptors and frame encoding
//!
//! The descriptor table is the single source of truth for setting names,
//! wire ids, value ranges and encodings. Values are range-checked against
//! the table before any bytes are produced; an out-of-range value never
//! reaches the network.

use crate::error::{Error, Result};

/// Wire encoding of a setting value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    /// Single unsigned byte
    U8,
    /// Single byte, two's-complement
    I8,
    /// 4 bytes, little-endian unsigned
    U32,
    /// 4 bytes, little-endian signed
    I32,
}

impl WireKind {
    /// Encoded width in bytes
    pub const fn width(self) -> usize {
        match self {
            WireKind::U8 | WireKind::I8 => 1,
            WireKind::U32 | WireKind::I32 => 4,
        }
    }

    /// Append the encoding of `value` (already range-checked to fit)
    pub fn encode_into(self, value: i64, out: &mut Vec<u8>) {
        match self {
            WireKind::U8 => out.push(value as u8),
            WireKind::I8 => out.push(value as i8 as u8),
            WireKind::U32 => out.extend_from_slice(&(value as u32).to_le_bytes()),
            WireKind::I32 => out.extend_from_slice(&(value as i32).to_le_bytes()),
        }
    }

    /// Decode a value previously produced by [`WireKind::encode_into`].
    /// Returns `None` if `bytes` is not exactly [`WireKind::width`] long.
    pub fn decode(self, bytes: &[u8]) -> Option<i64> {
        if bytes.len() != self.width() {
            return None;
        }
        let value = match self {
            WireKind::U8 => bytes[0] as i64,
            WireKind::I8 => bytes[0] as i8 as i64,
            WireKind::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
            WireKind::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
        };
        Some(value)
    }
}

/// Static metadata for one named setting
#[derive(Debug, Clone, Copy)]
pub struct SettingDescriptor {
    /// Operator-facing name (unique key)
    pub name: &'static str,
    /// Wire id (unique discriminant)
    pub id: u8,
    /// Lower bound, inclusive
    pub min: i64,
    /// Upper bound, inclusive
    pub max: i64,
    /// Wire encoding
    pub wire: WireKind,
}

/// Descriptor table, in wire order
///
/// The order is load-bearing: batch updates are matched positionally
/// against it, and the packed batch frame follows it byte for byte.
#[rustfmt::skip]
pub const TABLE: [SettingDescriptor; 15] = [
    SettingDescriptor { name: "autoExposure", id: 0x01, min: 0, max: 1, wire: WireKind::U8 },
    SettingDescriptor { name: "autoExposureBrightness", id: 0x02, min: -255, max: 255, wire: WireKind::I32 },
    SettingDescriptor { name: "exposure", id: 0x03, min: 0, max: 1_048_575, wire: WireKind::U32 },
    SettingDescriptor { name: "gain", id: 0x04, min: 0, max: 1023, wire: WireKind::U32 },
    SettingDescriptor { name: "autoWhiteBalance", id: 0x05, min: 0, max: 1, wire: WireKind::U8 },
    SettingDescriptor { name: "autoFocus", id: 0x06, min: 0, max: 1, wire: WireKind::U8 },
    SettingDescriptor { name: "focus", id: 0x07, min: 0, max: 250, wire: WireKind::U32 },
    SettingDescriptor { name: "autoHue", id: 0x08, min: 0, max: 1, wire: WireKind::U8 },
    SettingDescriptor { name: "hue", id: 0x09, min: -180, max: 180, wire: WireKind::I32 },
    SettingDescriptor { name: "saturation", id: 0x0A, min: 0, max: 255, wire: WireKind::U8 },
    SettingDescriptor { name: "contrast", id: 0x0B, min: 0, max: 255, wire: WireKind::U8 },
    SettingDescriptor { name: "sharpness", id: 0x0C, min: 0, max: 9, wire: WireKind::U8 },
    SettingDescriptor { name: "redGain", id: 0x0D, min: 0, max: 4095, wire: WireKind::U32 },
    SettingDescriptor { name: "greenGain", id: 0x0E, min: 0, max: 4095, wire: WireKind::U32 },
    SettingDescriptor { name: "blueGain", id: 0x0F, min: 0, max: 4095, wire: WireKind::U32 },
];

/// Width of the packed batch frame (values only, no id bytes)
pub const BATCH_FRAME_LEN: usize = batch_frame_len();

const fn batch_frame_len() -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < TABLE.len() {
        len += TABLE[i].wire.width();
        i += 1;
    }
    len
}

/// Look up a descriptor by name
pub fn find(name: &str) -> Option<&'static SettingDescriptor> {
    TABLE.iter().find(|d| d.name == name)
}

impl SettingDescriptor {
    /// Range-check a candidate value
    pub fn check(&self, value: i64) -> Result<()> {
        if value < self.min || value > self.max {
            return Err(Error::InvalidValue {
                setting: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Encode a single-setting command frame: `[id][value]`
    pub fn encode(&self, value: i64) -> Result<Vec<u8>> {
        self.check(value)?;
        let mut frame = Vec::with_capacity(1 + self.wire.width());
        frame.push(self.id);
        self.wire.encode_into(value, &mut frame);
        Ok(frame)
    }
}

/// Encode a full-table batch update
///
/// `values` are matched positionally (by index, not name) against [`TABLE`].
/// Any out-of-range value fails the whole batch; nothing is encoded.
pub fn encode_batch(values: &[i64]) -> Result<Vec<u8>> {
    if values.len() != TABLE.len() {
        return Err(Error::BatchArity {
            expected: TABLE.len(),
            actual: values.len(),
        });
    }

    for (index, (value, descriptor)) in values.iter().zip(TABLE.iter()).enumerate() {
        if *value < descriptor.min || *value > descriptor.max {
            return Err(Error::RangeViolation {
                index,
                value: *value,
            });
        }
    }

    let mut frame = Vec::with_capacity(BATCH_FRAME_LEN);
    for (value, descriptor) in values.iter().zip(TABLE.iter()) {
        descriptor.wire.encode_into(*value, &mut frame);
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_integrity() {
        for (i, d) in TABLE.iter().enumerate() {
            assert!(d.min <= d.max, "{}: empty range", d.name);
            for other in &TABLE[..i] {
                assert_ne!(d.id, other.id, "{} and {} share an id", d.name, other.name);
                assert_ne!(d.name, other.name);
            }
        }
        assert_eq!(TABLE[0].id, 0x01);
        assert_eq!(TABLE[14].id, 0x0F);
    }

    #[test]
    fn test_encode_gain() {
        let gain = find("gain").unwrap();
        assert_eq!(gain.encode(1023).unwrap(), [0x04, 0xFF, 0x03, 0x00, 0x00]);

        match gain.encode(1024) {
            Err(Error::InvalidValue { setting, value, min, max }) => {
                assert_eq!(setting, "gain");
                assert_eq!(value, 1024);
                assert_eq!((min, max), (0, 1023));
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_hue_negative() {
        let hue = find("hue").unwrap();
        assert_eq!(hue.encode(-180).unwrap(), [0x09, 0x4C, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_frame_shape() {
        for d in &TABLE {
            let frame = d.encode(d.min).unwrap();
            assert_eq!(frame.len(), 1 + d.wire.width(), "{}", d.name);
            assert_eq!(frame[0], d.id, "{}", d.name);
        }
    }

    #[test]
    fn test_boundary_round_trip() {
        for d in &TABLE {
            for value in [d.min, d.max] {
                let frame = d.encode(value).unwrap();
                let decoded = d.wire.decode(&frame[1..]).unwrap();
                assert_eq!(decoded, value, "{} at {}", d.name, value);
            }
        }
    }

    #[test]
    fn test_out_of_range_rejected_on_both_sides() {
        for d in &TABLE {
            assert!(d.encode(d.min - 1).is_err(), "{}", d.name);
            assert!(d.encode(d.max + 1).is_err(), "{}", d.name);
        }
    }

    #[test]
    fn test_find_unknown() {
        assert!(find("whiteBalanceTemperature").is_none());
        // Names are exact; lookup is case-sensitive
        assert!(find("Gain").is_none());
    }

    #[test]
    fn test_batch_frame_layout() {
        let values: Vec<i64> = TABLE.iter().map(|d| d.max).collect();
        let frame = encode_batch(&values).unwrap();
        assert_eq!(frame.len(), BATCH_FRAME_LEN);
        assert_eq!(BATCH_FRAME_LEN, 39);

        // gain sits after autoExposure (1) + autoExposureBrightness (4) +
        // exposure (4) = offset 9
        assert_eq!(&frame[9..13], &1023u32.to_le_bytes());
        // trailing blueGain
        assert_eq!(&frame[35..39], &4095u32.to_le_bytes());
    }

    #[test]
    fn test_batch_range_violation_reports_index() {
        let mut values: Vec<i64> = TABLE.iter().map(|d| d.min).collect();
        values[3] = 1024; // gain max is 1023

        match encode_batch(&values) {
            Err(Error::RangeViolation { index, value }) => {
                assert_eq!(index, 3);
                assert_eq!(value, 1024);
            }
            other => panic!("expected RangeViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_arity() {
        match encode_batch(&[0, 0, 0]) {
            Err(Error::BatchArity { expected, actual }) => {
                assert_eq!(expected, 15);
                assert_eq!(actual, 3);
            }
            other => panic!("expected BatchArity, got {:?}", other),
        }
    }

    #[test]
    fn test_i8_round_trip() {
        // No table entry uses I8, but the encoder supports it
        let mut out = Vec::new();
        WireKind::I8.encode_into(-5, &mut out);
        assert_eq!(out, [0xFB]);
        assert_eq!(WireKind::I8.decode(&out), Some(-5));
    }
}
