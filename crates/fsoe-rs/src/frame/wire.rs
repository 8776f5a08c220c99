// crates/fsoe-rs/src/frame/wire.rs
//! Transport-side model of the safety PDOs.

use super::mapping::CoeMappingEntry;
use crate::FsoeError;
use crate::hal::RegisterResolver;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use log::{error, trace};

/// A device register that can be mapped into a PDO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub identifier: String,
    pub index: u16,
    pub sub_index: u8,
}

impl Register {
    pub fn new(identifier: &str, index: u16, sub_index: u8) -> Self {
        Self {
            identifier: identifier.to_string(),
            index,
            sub_index,
        }
    }
}

/// One fixed-size field of a PDO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdoWireItem {
    /// `None` (or a register at index 0) is anonymous padding.
    pub register: Option<Register>,
    pub size_bits: u16,
}

impl PdoWireItem {
    pub fn padding(size_bits: u16) -> Self {
        Self {
            register: None,
            size_bits,
        }
    }

    pub fn mapped(register: Register, size_bits: u16) -> Self {
        Self {
            register: Some(register),
            size_bits,
        }
    }

    pub fn is_padding(&self) -> bool {
        self.register.as_ref().is_none_or(|register| register.index == 0)
    }

    /// Identifier of the mapped register, `None` for padding.
    pub fn identifier(&self) -> Option<&str> {
        match &self.register {
            Some(register) if register.index != 0 => Some(&register.identifier),
            _ => None,
        }
    }

    pub fn mapping_entry(&self) -> CoeMappingEntry {
        let (index, sub_index) = match &self.register {
            Some(register) => (register.index, register.sub_index),
            None => (0, 0),
        };
        CoeMappingEntry {
            index,
            sub_index,
            length_bits: self.size_bits as u8,
        }
    }
}

/// Direction of a PDO, seen from the slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdoDirection {
    /// Received by the slave: carries the master frame.
    Rx,
    /// Transmitted by the slave: carries the slave frame.
    Tx,
}

/// Ordered list of wire items plus the process data bytes they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdoMap {
    direction: PdoDirection,
    items: Vec<PdoWireItem>,
    buffer: Vec<u8>,
}

impl PdoMap {
    pub fn new(direction: PdoDirection) -> Self {
        Self {
            direction,
            items: Vec::new(),
            buffer: Vec::new(),
        }
    }

    /// Map for the master frame.
    pub fn rpdo() -> Self {
        Self::new(PdoDirection::Rx)
    }

    /// Map for the slave frame.
    pub fn tpdo() -> Self {
        Self::new(PdoDirection::Tx)
    }

    /// Rebuilds a map from the mapping values read from the device.
    pub fn from_mapping_values(
        direction: PdoDirection,
        values: &[u32],
        resolver: &impl RegisterResolver,
    ) -> Result<Self, FsoeError> {
        let mut map = Self::new(direction);
        for value in values {
            let entry = CoeMappingEntry::from_u32(*value);
            let item = if entry.is_padding() {
                PdoWireItem::padding(entry.length_bits as u16)
            } else {
                let register = resolver
                    .register_at(entry.index, entry.sub_index)
                    .ok_or_else(|| {
                        error!(
                            "Mapped object {:#06X}:{:02X} is not a known register",
                            entry.index, entry.sub_index
                        );
                        FsoeError::RegisterNotFound(format!(
                            "{:#06X}:{:02X}",
                            entry.index, entry.sub_index
                        ))
                    })?;
                PdoWireItem::mapped(register, entry.length_bits as u16)
            };
            map.add_item(item);
        }
        Ok(map)
    }

    pub fn direction(&self) -> PdoDirection {
        self.direction
    }

    pub fn items(&self) -> &[PdoWireItem] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.buffer.clear();
    }

    pub fn add_item(&mut self, item: PdoWireItem) {
        trace!(
            "{:?} PDO += {} ({} bits)",
            self.direction,
            item.identifier().unwrap_or("padding"),
            item.size_bits
        );
        self.items.push(item);
        self.buffer = vec![0; self.data_length_bytes()];
    }

    pub fn data_length_bits(&self) -> usize {
        self.items.iter().map(|item| item.size_bits as usize).sum()
    }

    pub fn data_length_bytes(&self) -> usize {
        self.data_length_bits().div_ceil(8)
    }

    /// Values to write into the CoE mapping object of this PDO.
    pub fn mapping_values(&self) -> Vec<u32> {
        self.items
            .iter()
            .map(|item| item.mapping_entry().to_u32())
            .collect()
    }

    /// Overwrites the process data bytes. `data` must have exactly the
    /// length of the map.
    pub fn set_item_bytes(&mut self, data: &[u8]) -> Result<(), FsoeError> {
        if data.len() != self.buffer.len() {
            error!(
                "{:?} PDO expects {} bytes, got {}",
                self.direction,
                self.buffer.len(),
                data.len()
            );
            return Err(FsoeError::InvalidFrameLength(data.len()));
        }
        self.buffer.copy_from_slice(data);
        Ok(())
    }

    pub fn get_item_bytes(&self) -> &[u8] {
        &self.buffer
    }
}
