// crates/fsoe-rs/src/frame/slots.rs
//! Partition of a map into safe data blocks (ETG.5120 section 5.3.3).

use crate::map::{DictionaryMap, MappedEntry};
use crate::types::C_FSOE_SHORT_SLOT_WIDTH;
use alloc::vec::Vec;
use core::mem;
use log::trace;

/// One piece of a safe data block.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotEntry<'a> {
    /// Bits of the entry that land in this block, when it does not fit whole.
    pub bits_override: Option<u16>,
    /// The mapped entry, or `None` for the virtual padding that stands for
    /// the continuation of an entry split across blocks.
    pub entry: Option<&'a MappedEntry>,
    /// Bit position of this piece in the safe data.
    pub position_bits: u16,
}

impl SlotEntry<'_> {
    /// Bits this piece occupies in the block.
    pub fn bits(&self) -> u16 {
        match (self.bits_override, self.entry) {
            (Some(bits), _) => bits,
            (None, Some(entry)) => entry.bits(),
            (None, None) => 0,
        }
    }

    pub fn is_virtual_padding(&self) -> bool {
        self.entry.is_none()
    }

    /// True if only part of the entry lands in this block.
    pub fn is_split(&self) -> bool {
        matches!((self.bits_override, self.entry), (Some(bits), Some(entry)) if bits < entry.bits())
    }
}

/// A safe data block and the pieces it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<'a> {
    pub index: usize,
    pub entries: Vec<SlotEntry<'a>>,
}

impl Slot<'_> {
    pub fn used_bits(&self) -> u16 {
        self.entries.iter().map(SlotEntry::bits).sum()
    }
}

/// Splits the map into safe data blocks of `slot_width` bits.
///
/// The first block holds 8 bits as long as the payload fits in a byte and
/// grows to `slot_width` as soon as an entry overflows it. An entry that
/// does not fit in the current block is cut: the part that fits stays with
/// a bits override, the rest becomes virtual padding in the next block(s).
pub fn generate_slot_structure(map: &DictionaryMap, slot_width: u16) -> Vec<Slot<'_>> {
    let mut slots = Vec::new();
    let mut current: Vec<SlotEntry<'_>> = Vec::new();
    let mut index = 0usize;
    let mut slot_bit_maximum = C_FSOE_SHORT_SLOT_WIDTH;

    for (position, entry) in map.iter() {
        let bits = entry.bits();
        if bits == 0 {
            continue;
        }

        if slot_bit_maximum == C_FSOE_SHORT_SLOT_WIDTH && position + bits > slot_bit_maximum {
            slot_bit_maximum = slot_width;
        }

        if position >= slot_bit_maximum {
            if !current.is_empty() {
                slots.push(Slot {
                    index,
                    entries: mem::take(&mut current),
                });
            }
            index += 1;
            slot_bit_maximum += slot_width;
        }

        if position + bits <= slot_bit_maximum {
            current.push(SlotEntry {
                bits_override: None,
                entry: Some(entry),
                position_bits: position,
            });
            continue;
        }

        let bits_in_slot = slot_width - position % slot_width;
        trace!(
            "{} ({} bits @ {}) split across blocks, {} bits in block {}",
            entry.name(),
            bits,
            position,
            bits_in_slot,
            index
        );
        current.push(SlotEntry {
            bits_override: Some(bits_in_slot),
            entry: Some(entry),
            position_bits: position,
        });
        slots.push(Slot {
            index,
            entries: mem::take(&mut current),
        });

        let mut remaining = bits - bits_in_slot;
        let mut virtual_position = position + bits_in_slot;
        while remaining > 0 {
            index += 1;
            slot_bit_maximum += slot_width;
            let bits_here = remaining.min(slot_width);
            current.push(SlotEntry {
                bits_override: Some(bits_here),
                entry: None,
                position_bits: virtual_position,
            });
            if remaining > slot_width {
                slots.push(Slot {
                    index,
                    entries: mem::take(&mut current),
                });
            }
            remaining -= bits_here;
            virtual_position += bits_here;
        }
    }

    if !current.is_empty() {
        slots.push(Slot {
            index,
            entries: current,
        });
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryItem;
    use crate::types::{C_FSOE_SLOT_WIDTH, DataType, MapRole};
    use alloc::sync::Arc;
    use alloc::vec;

    fn item(name: &str, key: u32, data_type: DataType) -> Arc<DictionaryItem> {
        Arc::new(DictionaryItem::input_output(name, key, data_type))
    }

    /// (slot index, [(bits, is virtual padding)])
    fn shape(map: &DictionaryMap) -> Vec<(usize, Vec<(u16, bool)>)> {
        generate_slot_structure(map, C_FSOE_SLOT_WIDTH)
            .into_iter()
            .map(|slot| {
                let entries = slot
                    .entries
                    .iter()
                    .map(|e| (e.bits(), e.is_virtual_padding()))
                    .collect();
                (slot.index, entries)
            })
            .collect()
    }

    #[test]
    fn test_empty_map_has_no_slots() {
        let map = DictionaryMap::new(MapRole::Outputs);
        assert!(generate_slot_structure(&map, C_FSOE_SLOT_WIDTH).is_empty());
    }

    #[test]
    fn test_byte_payload_stays_in_short_slot() {
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&item("A", 1, DataType::Bool)).unwrap();
        map.add_padding(7).unwrap();
        assert_eq!(shape(&map), [(0, vec![(1, false), (7, false)])]);
    }

    #[test]
    fn test_double_word_is_split_in_two_slots() {
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&item("DW", 1, DataType::UInt32)).unwrap();

        let slots = generate_slot_structure(&map, C_FSOE_SLOT_WIDTH);
        assert_eq!(slots.len(), 2);
        assert!(slots[0].entries[0].is_split());
        assert_eq!(slots[0].used_bits(), 16);
        assert_eq!(slots[1].entries[0].position_bits, 16);
        assert_eq!(shape(&map), [(0, vec![(16, false)]), (1, vec![(16, true)])]);
    }

    #[test]
    fn test_word_crossing_block_boundary() {
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&item("B", 1, DataType::UInt8)).unwrap();
        map.add(&item("W", 2, DataType::UInt16)).unwrap();
        map.add_padding(8).unwrap();
        assert_eq!(
            shape(&map),
            [
                (0, vec![(8, false), (8, false)]),
                (1, vec![(8, true), (8, false)])
            ]
        );
    }

    #[test]
    fn test_long_split_yields_full_virtual_slots() {
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&item("B", 1, DataType::UInt8)).unwrap();
        map.add(&item("DW", 2, DataType::UInt32)).unwrap();
        map.add_padding(8).unwrap();
        assert_eq!(
            shape(&map),
            [
                (0, vec![(8, false), (8, false)]),
                (1, vec![(16, true)]),
                (2, vec![(8, true), (8, false)])
            ]
        );
    }

    #[test]
    fn test_entries_after_exact_split_open_a_new_slot() {
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&item("DW", 1, DataType::UInt32)).unwrap();
        map.add(&item("W", 2, DataType::UInt16)).unwrap();
        assert_eq!(
            shape(&map),
            [
                (0, vec![(16, false)]),
                (1, vec![(16, true)]),
                (2, vec![(16, false)])
            ]
        );
    }
}
