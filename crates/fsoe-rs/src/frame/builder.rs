// crates/fsoe-rs/src/frame/builder.rs
//! Conversion between dictionary maps and safety PDO wire layouts.

use super::elements::FrameElements;
use super::slots::{Slot, generate_slot_structure};
use super::wire::{PdoMap, PdoWireItem};
use crate::FsoeError;
use crate::config::FrameLimits;
use crate::dictionary::SafetyItemDictionary;
use crate::hal::RegisterResolver;
use crate::log::{my_debug, my_error, my_warn};
use crate::map::{DictionaryMap, MappedEntry};
use crate::types::{
    C_FSOE_COMMAND_BITS, C_FSOE_CONN_ID_BITS, C_FSOE_CRC_BITS, C_FSOE_MIN_FRAME_BYTES,
    C_FSOE_SHORT_SLOT_WIDTH, C_FSOE_SLOT_WIDTH,
};
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use log::error;

/// Returns the byte offsets of a safety PDU of `pdo_byte_length` bytes
/// that carry safe data.
///
/// Byte 0 is the command and the last two bytes are the connection id.
/// A 6-byte frame has a single data byte (offset 1); longer frames repeat
/// 2 data bytes + 2 CRC bytes, so block `i` holds bytes `1 + 4i` and `2 + 4i`.
pub fn safety_bytes(pdo_byte_length: usize) -> Result<Vec<usize>, FsoeError> {
    match pdo_byte_length {
        n if n < C_FSOE_MIN_FRAME_BYTES => {
            error!("Safety PDU of {} bytes is shorter than the minimum frame", n);
            Err(FsoeError::InvalidFrameLength(n))
        }
        C_FSOE_MIN_FRAME_BYTES => Ok(vec![1]),
        n if (n - 3) % 4 == 0 => {
            let blocks = (n - 3) / 4;
            Ok((0..blocks)
                .flat_map(|block| [1 + block * 4, 2 + block * 4])
                .collect())
        }
        n => {
            error!("Safety PDU of {} bytes does not hold a whole number of blocks", n);
            Err(FsoeError::InvalidFrameLength(n))
        }
    }
}

/// Builds safety PDU wire maps from dictionary maps and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameBuilder {
    limits: FrameLimits,
}

impl FrameBuilder {
    pub const fn new(limits: FrameLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &FrameLimits {
        &self.limits
    }

    /// Safe data blocks of `map`.
    pub fn slot_structure<'a>(&self, map: &'a DictionaryMap) -> Vec<Slot<'a>> {
        generate_slot_structure(map, C_FSOE_SLOT_WIDTH)
    }

    /// Clears `pdo_map` and fills it with the frame for `map`: the command,
    /// each safe data block followed by its CRC, and the connection id.
    ///
    /// The last block is padded up to its width, and an empty map is sent
    /// as one byte of padding. `pdo_map` is left untouched on error.
    pub fn fill_pdo_map(
        &self,
        map: &DictionaryMap,
        resolver: &impl RegisterResolver,
        pdo_map: &mut PdoMap,
        elements: &FrameElements,
    ) -> Result<(), FsoeError> {
        let frame_item = |uid: &str, size_bits: u16| {
            resolver
                .register(uid)
                .map(|register| PdoWireItem::mapped(register, size_bits))
                .ok_or_else(|| {
                    my_error!(*elements, "Frame element {} has no register", uid);
                    FsoeError::RegisterNotFound(uid.to_string())
                })
        };
        let crc_item = |slot: usize| {
            resolver
                .register(&elements.crc_uid(slot))
                .map(|register| PdoWireItem::mapped(register, C_FSOE_CRC_BITS))
                .ok_or_else(|| {
                    my_error!(*elements, "No CRC found for data slot {}", slot);
                    FsoeError::MissingCrc { slot }
                })
        };

        let total_bits = map.safety_bits();
        let slots = self.slot_structure(map);
        let mut items = vec![frame_item(elements.command_uid, C_FSOE_COMMAND_BITS)?];

        if slots.is_empty() {
            items.push(PdoWireItem::padding(C_FSOE_SHORT_SLOT_WIDTH));
            items.push(crc_item(0)?);
        }

        for (position, slot) in slots.iter().enumerate() {
            for piece in &slot.entries {
                let item = match piece.entry {
                    Some(MappedEntry::Item(item)) => frame_item(&item.name, piece.bits())?,
                    Some(MappedEntry::Padding(_)) | None => PdoWireItem::padding(piece.bits()),
                };
                items.push(item);
            }

            if position + 1 == slots.len() {
                let capacity = if slot.index == 0 && total_bits <= C_FSOE_SHORT_SLOT_WIDTH {
                    C_FSOE_SHORT_SLOT_WIDTH
                } else {
                    C_FSOE_SLOT_WIDTH
                };
                let used = slot.used_bits();
                if used < capacity {
                    items.push(PdoWireItem::padding(capacity - used));
                }
            }
            items.push(crc_item(slot.index)?);
        }

        items.push(frame_item(elements.connection_id_uid, C_FSOE_CONN_ID_BITS)?);

        pdo_map.clear();
        for item in items {
            pdo_map.add_item(item);
        }
        my_debug!(
            *elements,
            "Filled {:?} PDO: {} items, {} bytes, {} safe data blocks",
            pdo_map.direction(),
            pdo_map.items().len(),
            pdo_map.data_length_bytes(),
            slots.len().max(1)
        );
        Ok(())
    }

    /// Appends to `map` the safe data found in `pdo_map`.
    ///
    /// Only wire items starting in a safe data byte are considered. Items
    /// whose register is a dictionary item are mapped; anything else is
    /// padding. The virtual padding that follows a split item is folded
    /// back into the item. Adjacent paddings are merged at the end.
    pub fn fill_dictionary_map_from_pdo(
        &self,
        pdo_map: &PdoMap,
        dictionary: &SafetyItemDictionary,
        map: &mut DictionaryMap,
    ) -> Result<(), FsoeError> {
        let valid_bytes = safety_bytes(pdo_map.data_length_bytes())?;
        let mut position_bits = 0usize;
        // Bits of a split item still expected as virtual padding.
        let mut pending_virtual_padding = 0u16;

        for wire_item in pdo_map.items() {
            let starts_in_safe_data = valid_bytes.contains(&(position_bits / 8));
            position_bits += wire_item.size_bits as usize;
            if !starts_in_safe_data {
                continue;
            }

            let item = wire_item.identifier().and_then(|identifier| {
                let item = dictionary.get(identifier);
                if item.is_none() {
                    my_warn!(
                        map.role(),
                        "Wire item {} is not a safety item, reading it as padding",
                        identifier
                    );
                }
                item
            });

            match item {
                Some(item) => {
                    pending_virtual_padding = item.bits().saturating_sub(wire_item.size_bits);
                    map.add(item)?;
                }
                None if pending_virtual_padding >= wire_item.size_bits => {
                    pending_virtual_padding -= wire_item.size_bits;
                }
                None => {
                    map.add_padding(wire_item.size_bits - pending_virtual_padding)?;
                    pending_virtual_padding = 0;
                }
            }
        }

        map.merge_adjacent_paddings()?;
        my_debug!(
            map.role(),
            "Rebuilt map from {} byte PDO: {} entries, {} bits",
            pdo_map.data_length_bytes(),
            map.len(),
            map.safety_bits()
        );
        Ok(())
    }
}
