//! Core data types for BRIK decoding

use crate::error::{BrikError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Voxel data types, numbered by their `BRICK_TYPES` code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataType {
    /// Unsigned 8-bit integer
    U8 = 0,
    /// Signed 16-bit integer
    I16 = 1,
    /// Signed 32-bit integer
    I32 = 2,
    /// 32-bit IEEE floating point
    F32 = 3,
    /// 64-bit IEEE floating point
    F64 = 4,
    /// Complex number, a pair of 64-bit floats (real, imaginary)
    Complex64 = 5,
}

impl DataType {
    /// Map a `BRICK_TYPES` code to its data type
    pub fn from_brick_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(DataType::U8),
            1 => Ok(DataType::I16),
            2 => Ok(DataType::I32),
            3 => Ok(DataType::F32),
            4 => Ok(DataType::F64),
            5 => Ok(DataType::Complex64),
            _ => Err(BrikError::UnknownBrickType(code)),
        }
    }

    /// Size in bytes of one stored element
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::U8 => 1,
            DataType::I16 => 2,
            DataType::I32 | DataType::F32 => 4,
            DataType::F64 => 8,
            DataType::Complex64 => 16,
        }
    }

    /// Element type after multiplying by a floating point scale factor
    pub fn scaled(&self) -> Self {
        match self {
            DataType::U8 | DataType::I16 | DataType::F32 => DataType::F32,
            DataType::I32 | DataType::F64 => DataType::F64,
            DataType::Complex64 => DataType::Complex64,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Byte order of multi-byte elements in a BRIK payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// `LSB_FIRST`
    LittleEndian,
    /// `MSB_FIRST`
    BigEndian,
    /// Byte order of the machine doing the reading
    Native,
}

impl ByteOrder {
    /// Interpret a `BYTEORDER_STRING` value
    pub fn from_header_string(value: &str) -> Option<Self> {
        match value {
            "LSB_FIRST" => Some(ByteOrder::LittleEndian),
            "MSB_FIRST" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    pub fn header_string(&self) -> Option<&'static str> {
        match self {
            ByteOrder::LittleEndian => Some("LSB_FIRST"),
            ByteOrder::BigEndian => Some("MSB_FIRST"),
            ByteOrder::Native => None,
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::Native
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.header_string() {
            Some(s) => f.write_str(s),
            None => f.write_str("native"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brick_codes() {
        assert_eq!(DataType::from_brick_code(0).unwrap(), DataType::U8);
        assert_eq!(DataType::from_brick_code(1).unwrap(), DataType::I16);
        assert_eq!(DataType::from_brick_code(5).unwrap(), DataType::Complex64);
        assert!(matches!(
            DataType::from_brick_code(6),
            Err(BrikError::UnknownBrickType(6))
        ));
        assert!(matches!(
            DataType::from_brick_code(-1),
            Err(BrikError::UnknownBrickType(-1))
        ));
    }

    #[test]
    fn test_data_type_sizes() {
        assert_eq!(DataType::U8.size_in_bytes(), 1);
        assert_eq!(DataType::I16.size_in_bytes(), 2);
        assert_eq!(DataType::I32.size_in_bytes(), 4);
        assert_eq!(DataType::F32.size_in_bytes(), 4);
        assert_eq!(DataType::F64.size_in_bytes(), 8);
        assert_eq!(DataType::Complex64.size_in_bytes(), 16);
    }

    #[test]
    fn test_scaled_types_are_floating() {
        assert_eq!(DataType::I16.scaled(), DataType::F32);
        assert_eq!(DataType::I32.scaled(), DataType::F64);
        assert_eq!(DataType::U8.scaled(), DataType::F32);
        assert_eq!(DataType::F64.scaled(), DataType::F64);
        assert_eq!(DataType::Complex64.scaled(), DataType::Complex64);
    }

    #[test]
    fn test_byte_order() {
        assert_eq!(
            ByteOrder::from_header_string("LSB_FIRST"),
            Some(ByteOrder::LittleEndian)
        );
        assert_eq!(
            ByteOrder::from_header_string("MSB_FIRST"),
            Some(ByteOrder::BigEndian)
        );
        assert_eq!(ByteOrder::from_header_string("lsb_first"), None);
        assert_eq!(ByteOrder::Native.header_string(), None);
        assert_eq!(ByteOrder::BigEndian.to_string(), "MSB_FIRST");
        assert_eq!(ByteOrder::Native.to_string(), "native");
    }
}
