// crates/fsoe-rs/src/types.rs
use core::fmt;

// --- Protocol Constants (ETG.5100 / ETG.5120) ---

/// Width of a safe data block (slot), in bits.
pub const C_FSOE_SLOT_WIDTH: u16 = 16;

/// Width of the first safe data block when the whole payload fits in one byte.
pub const C_FSOE_SHORT_SLOT_WIDTH: u16 = 8;

/// Maximum number of safe data blocks in one safety PDU.
pub const C_FSOE_MAX_SAFE_DATA_BLOCKS: usize = 8;

/// Maximum number of PDO objects a safety PDU may be mapped to.
pub const C_FSOE_MAX_FRAME_OBJECTS: usize = 45;

/// Width of the command field that opens every safety PDU.
pub const C_FSOE_COMMAND_BITS: u16 = 8;

/// Width of the CRC that follows each safe data block.
pub const C_FSOE_CRC_BITS: u16 = 16;

/// Width of the connection id that closes every safety PDU.
pub const C_FSOE_CONN_ID_BITS: u16 = 16;

/// Widest layout a dictionary map accepts, in bits. Positions inside a
/// map always stay below this bound.
pub const C_FSOE_MAX_MAP_BITS: u16 = 0x8000;

/// Shortest possible safety PDU: command + 1 data byte + CRC + connection id.
pub const C_FSOE_MIN_FRAME_BYTES: usize = 6;

/// Name of the Safe Torque Off command, which must open every safety map.
pub const C_FSOE_STO_UID: &str = "FSOE_STO";

/// Data types a safety variable can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    UInt8,
    UInt16,
    UInt32,
    Int8,
    Int16,
    Int32,
    Float,
}

impl DataType {
    /// Width of the variable inside a safety PDU, in bits.
    pub const fn bits(self) -> u16 {
        match self {
            DataType::Bool => 1,
            DataType::UInt8 | DataType::Int8 => 8,
            DataType::UInt16 | DataType::Int16 => 16,
            DataType::UInt32 | DataType::Int32 | DataType::Float => 32,
        }
    }

    /// Bytes used when the value is serialized on its own (bool takes a full byte).
    pub const fn byte_len(self) -> usize {
        match self {
            DataType::Bool => 1,
            _ => self.bits() as usize / 8,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "BOOL",
            DataType::UInt8 => "UINT8",
            DataType::UInt16 => "UINT16",
            DataType::UInt32 => "UINT32",
            DataType::Int8 => "INT8",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Float => "FLOAT",
        };
        f.write_str(name)
    }
}

/// Which half of the process image a map describes.
///
/// Outputs travel master -> slave (the RPDO of the drive), inputs travel
/// slave -> master (the TPDO of the drive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapRole {
    Outputs,
    Inputs,
}

impl fmt::Display for MapRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapRole::Outputs => f.write_str("outputs"),
            MapRole::Inputs => f.write_str("inputs"),
        }
    }
}

/// Rounds `position` up to the next multiple of `align`.
/// An alignment of 0 or 1 leaves the position untouched.
pub const fn align_up(position: u16, align: u16) -> u16 {
    if align <= 1 {
        position
    } else {
        position.div_ceil(align) * align
    }
}
