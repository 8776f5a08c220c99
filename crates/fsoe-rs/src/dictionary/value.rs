// crates/fsoe-rs/src/dictionary/value.rs

use crate::types::DataType;
use alloc::vec::Vec;

/// A value of one of the safety data types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SafeValue {
    Bool(bool),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Float(f32),
}

impl SafeValue {
    /// The zero value of a data type (`false` for booleans).
    pub const fn zero(data_type: DataType) -> Self {
        match data_type {
            DataType::Bool => SafeValue::Bool(false),
            DataType::UInt8 => SafeValue::UInt8(0),
            DataType::UInt16 => SafeValue::UInt16(0),
            DataType::UInt32 => SafeValue::UInt32(0),
            DataType::Int8 => SafeValue::Int8(0),
            DataType::Int16 => SafeValue::Int16(0),
            DataType::Int32 => SafeValue::Int32(0),
            DataType::Float => SafeValue::Float(0.0),
        }
    }

    pub const fn data_type(&self) -> DataType {
        match self {
            SafeValue::Bool(_) => DataType::Bool,
            SafeValue::UInt8(_) => DataType::UInt8,
            SafeValue::UInt16(_) => DataType::UInt16,
            SafeValue::UInt32(_) => DataType::UInt32,
            SafeValue::Int8(_) => DataType::Int8,
            SafeValue::Int16(_) => DataType::Int16,
            SafeValue::Int32(_) => DataType::Int32,
            SafeValue::Float(_) => DataType::Float,
        }
    }

    /// Serializes the value into a little-endian byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            SafeValue::Bool(v) => (*v as u8).to_le_bytes().to_vec(), // Serialize as u8
            SafeValue::UInt8(v) => v.to_le_bytes().to_vec(),
            SafeValue::UInt16(v) => v.to_le_bytes().to_vec(),
            SafeValue::UInt32(v) => v.to_le_bytes().to_vec(),
            SafeValue::Int8(v) => v.to_le_bytes().to_vec(),
            SafeValue::Int16(v) => v.to_le_bytes().to_vec(),
            SafeValue::Int32(v) => v.to_le_bytes().to_vec(),
            SafeValue::Float(v) => v.to_le_bytes().to_vec(),
        }
    }
}
