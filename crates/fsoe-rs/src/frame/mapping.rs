// crates/fsoe-rs/src/frame/mapping.rs

/// A CoE PDO mapping entry, as stored in the sub-indices of the
/// 0x16xx (RxPDO) and 0x1Axx (TxPDO) mapping objects.
///
/// Layout of the 32-bit value: index (bits 16-31), sub-index (bits 8-15),
/// length in bits (bits 0-7). Index 0 maps padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoeMappingEntry {
    pub index: u16,
    pub sub_index: u8,
    pub length_bits: u8,
}

impl CoeMappingEntry {
    /// Deserializes a mapping entry from the value read from the device.
    pub fn from_u32(value: u32) -> Self {
        Self {
            index: (value >> 16) as u16,
            sub_index: ((value >> 8) & 0xFF) as u8,
            length_bits: (value & 0xFF) as u8,
        }
    }

    /// Serializes the mapping entry into the value written to the device.
    pub fn to_u32(&self) -> u32 {
        ((self.index as u32) << 16) | ((self.sub_index as u32) << 8) | self.length_bits as u32
    }

    pub fn is_padding(&self) -> bool {
        self.index == 0
    }
}
