//! The closed register data-type enumeration and its decode/encode rules.

use std::fmt;

/// Register datatype tag. Order matches the wire/table convention the
/// binding table is built against; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bitfield,
    Enumeration,
    BinaryPointS0,
    BinaryPointS1,
    BinaryPointS2,
    BinaryPointS3,
    BinaryPointS4,
    BinaryPointS5,
    BinaryPointS6,
    BinaryPointS7,
    BinaryPointS8,
    BinaryPointS9,
    BinaryPointU0,
    BinaryPointU1,
    BinaryPointU2,
    BinaryPointU3,
    BinaryPointU4,
    BinaryPointU5,
    BinaryPointU6,
    BinaryPointU7,
    BinaryPointU8,
    BinaryPointU9,
    Str,
}

/// Coarse dispatch kind, mirroring the upstream `decodeDT` grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bitfield,
    BinaryPoint,
    Enumeration,
    Str,
}

impl DataType {
    pub fn kind(self) -> Kind {
        use DataType::*;
        match self {
            Bitfield => Kind::Bitfield,
            Enumeration => Kind::Enumeration,
            Str => Kind::Str,
            _ => Kind::BinaryPoint,
        }
    }

    /// `(scale, signed)` for the binary-point variants; `(0, false)` for the rest.
    pub fn scale(self) -> (u8, bool) {
        use DataType::*;
        match self {
            BinaryPointS0 => (0, true),
            BinaryPointS1 => (1, true),
            BinaryPointS2 => (2, true),
            BinaryPointS3 => (3, true),
            BinaryPointS4 => (4, true),
            BinaryPointS5 => (5, true),
            BinaryPointS6 => (6, true),
            BinaryPointS7 => (7, true),
            BinaryPointS8 => (8, true),
            BinaryPointS9 => (9, true),
            BinaryPointU0 => (0, false),
            BinaryPointU1 => (1, false),
            BinaryPointU2 => (2, false),
            BinaryPointU3 => (3, false),
            BinaryPointU4 => (4, false),
            BinaryPointU5 => (5, false),
            BinaryPointU6 => (6, false),
            BinaryPointU7 => (7, false),
            BinaryPointU8 => (8, false),
            BinaryPointU9 => (9, false),
            Bitfield | Enumeration | Str => (0, false),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A decoded register value, tagged by the coarse kind that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bitfield(u64),
    Enumeration(u64),
    Text(String),
    Number(f64),
}

impl Value {
    pub fn as_bitfield(&self) -> Option<u64> {
        match self {
            Value::Bitfield(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Decodes `raw` (big-endian register bytes, `raw.len()` up to 8) per `dt`.
pub fn decode(dt: DataType, raw: &[u8]) -> Value {
    use crate::byteorder::be_bytes_to_u64;

    match dt.kind() {
        Kind::Bitfield => Value::Bitfield(be_bytes_to_u64(raw)),
        Kind::Enumeration => Value::Enumeration(be_bytes_to_u64(raw)),
        Kind::Str => Value::Text(
            String::from_utf8_lossy(raw)
                .trim_end_matches('\0')
                .to_string(),
        ),
        Kind::BinaryPoint => {
            let (scale, signed) = dt.scale();
            let unsigned = be_bytes_to_u64(raw);
            let nbits = raw.len() * 8;
            let signed_value = if signed && nbits < 64 {
                // Sign-extend by shifting the value into the top of an i64
                // and arithmetic-shifting back down; Rust's `>>` on signed
                // integers is always arithmetic, unlike C's implementation
                // defined behavior for the same operation.
                let shift = 64 - nbits;
                ((unsigned as i64) << shift) >> shift
            } else {
                unsigned as i64
            };
            Value::Number(signed_value as f64 / (1u64 << scale) as f64)
        }
    }
}

/// Encodes `value` back into `nbytes` big-endian register bytes for `dt`.
///
/// Only meaningful for binary-point types; the driver never writes
/// bitfield/enumeration/string registers through this path (those are
/// written as raw bitmasks by the command table instead).
pub fn encode(dt: DataType, value: f64, nbytes: usize) -> crate::error::ModbusResult<Vec<u8>> {
    use crate::byteorder::u64_to_be_bytes;
    use crate::error::{FatalError, ModbusError};

    let (scale, signed) = dt.scale();
    if dt.kind() != Kind::BinaryPoint {
        return Err(ModbusError::Fatal(FatalError::Transport(format!(
            "{dt} is not an encodable binary-point type"
        ))));
    }

    // The sign/scale asymmetry below is inherited from the source protocol:
    // a signed, unscaled value rounds via plain `ceil`, while every other
    // case rounds via `ceil(value * 2^scale + 0.5)`. Mixing the two at a
    // scale boundary (e.g. switching a register's datatype from S0 to S1
    // without revisiting call sites) silently changes rounding behavior.
    let scaled: f64 = if signed && scale == 0 {
        value.ceil()
    } else {
        (value * (1u64 << scale) as f64 + 0.5).ceil()
    };

    let raw = if signed {
        (scaled as i64 as u64) & mask_for(nbytes)
    } else {
        scaled as u64
    };

    Ok(u64_to_be_bytes(raw, nbytes))
}

fn mask_for(nbytes: usize) -> u64 {
    if nbytes >= 8 {
        u64::MAX
    } else {
        (1u64 << (nbytes * 8)) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_voltage_register_142_decodes_to_known_reading() {
        // raw 0x0ED8 = 3800, BINARYPOINT_U6 (divide by 64) => 59.375
        let raw = [0x0E, 0xD8];
        let v = decode(DataType::BinaryPointU6, &raw);
        assert!((v.as_f64().unwrap() - 59.375).abs() < 1e-9);
    }

    #[test]
    fn signed_s7_negative_two_sixteenths_example() {
        let raw = [0xFF, 0xFE];
        let v = decode(DataType::BinaryPointS7, &raw);
        assert!((v.as_f64().unwrap() - (-2.0 / 128.0)).abs() < 1e-9);
    }

    #[test]
    fn bitfield_is_returned_unscaled() {
        let v = decode(DataType::Bitfield, &[0x00, 0x04]);
        assert_eq!(v.as_bitfield(), Some(0x04));
    }

    #[test]
    fn string_trims_trailing_nuls() {
        let v = decode(DataType::Str, b"ABC\0\0");
        assert_eq!(v, Value::Text("ABC".to_string()));
    }

    #[test]
    fn encode_rounds_up_past_the_halfway_nudge() {
        // 59.375 * 64 = 3800 exactly, but the `+ 0.5` / `ceil` combination
        // still bumps it to 3801 (0x0ED9), not back down to 3800.
        let raw = encode(DataType::BinaryPointU6, 59.375, 2).unwrap();
        assert_eq!(raw, vec![0x0E, 0xD9]);
    }
}
