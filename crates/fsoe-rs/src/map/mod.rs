// crates/fsoe-rs/src/map/mod.rs
//! Editable bit layouts of the two halves of the process image.

mod entry;
mod placement;
mod text;

pub use entry::MappedEntry;

use crate::FsoeError;
use crate::dictionary::DictionaryItem;
use crate::log::{my_debug, my_error};
use crate::types::{
    C_FSOE_MAX_MAP_BITS, C_FSOE_SHORT_SLOT_WIDTH, C_FSOE_SLOT_WIDTH, MapRole, align_up,
};
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Ordered sequence of mapped entries.
///
/// The bit position of an entry is the sum of the widths of the entries
/// before it, so the layout never has gaps or overlaps. All mutators fail
/// with `MappingLocked` once the map has been locked, and edits that would
/// grow it past `C_FSOE_MAX_MAP_BITS` fail with `MapOverflow`.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryMap {
    role: MapRole,
    entries: Vec<MappedEntry>,
    locked: bool,
}

impl DictionaryMap {
    /// Creates an empty, editable map.
    pub fn new(role: MapRole) -> Self {
        Self {
            role,
            entries: Vec::new(),
            locked: false,
        }
    }

    pub fn role(&self) -> MapRole {
        self.role
    }

    pub fn editable(&self) -> bool {
        !self.locked
    }

    /// Freezes the map, typically once the slave has accepted its wire layout.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn entries(&self) -> &[MappedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(position_bits, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &MappedEntry)> {
        self.entries.iter().scan(0u16, |position, entry| {
            let start = *position;
            *position += entry.bits();
            Some((start, entry))
        })
    }

    /// Total width of the mapped safe data, in bits.
    pub fn safety_bits(&self) -> u16 {
        self.entries.iter().map(MappedEntry::bits).sum()
    }

    /// Bit position of the entry at `index`.
    pub fn position_bits(&self, index: usize) -> Option<u16> {
        self.iter().nth(index).map(|(position, _)| position)
    }

    /// Bit position of the first entry mapping `item`.
    pub fn position_of(&self, item: &DictionaryItem) -> Option<u16> {
        self.iter()
            .find(|(_, entry)| entry.maps(item))
            .map(|(position, _)| position)
    }

    pub fn contains(&self, item: &DictionaryItem) -> bool {
        self.entries.iter().any(|entry| entry.maps(item))
    }

    fn check_editable(&self) -> Result<(), FsoeError> {
        if self.locked {
            my_error!(self.role, "Attempted to edit a locked map");
            return Err(FsoeError::MappingLocked(self.role));
        }
        Ok(())
    }

    fn check_accepts(&self, item: &DictionaryItem) -> Result<(), FsoeError> {
        self.check_editable()?;
        if !item.accepted_by(self.role) {
            return Err(FsoeError::KindMismatch {
                item: item.name.to_string(),
                role: self.role,
            });
        }
        Ok(())
    }

    /// Fails if `extra_bits` more bits would not fit in the map.
    pub(crate) fn check_room(&self, extra_bits: u16) -> Result<(), FsoeError> {
        let bits = u32::from(self.safety_bits()) + u32::from(extra_bits);
        if bits > u32::from(C_FSOE_MAX_MAP_BITS) {
            my_error!(self.role, "Map would grow to {} bits", bits);
            return Err(FsoeError::MapOverflow {
                role: self.role,
                bits,
            });
        }
        Ok(())
    }

    fn index_of(&self, item: &DictionaryItem) -> Result<usize, FsoeError> {
        self.entries
            .iter()
            .position(|entry| entry.maps(item))
            .ok_or_else(|| FsoeError::ItemNotFound(item.name.to_string()))
    }

    /// Appends an item at the end of the map.
    pub fn add(&mut self, item: &Arc<DictionaryItem>) -> Result<&MappedEntry, FsoeError> {
        self.check_accepts(item)?;
        self.check_room(item.bits())?;
        self.entries.push(MappedEntry::Item(item.clone()));
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Appends `bits` bits of padding at the end of the map.
    pub fn add_padding(&mut self, bits: u16) -> Result<&MappedEntry, FsoeError> {
        self.check_editable()?;
        self.check_room(bits)?;
        self.entries.push(MappedEntry::Padding(bits));
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Removes the first entry mapping `item`. Later entries move back.
    pub fn remove(&mut self, item: &DictionaryItem) -> Result<(), FsoeError> {
        self.check_editable()?;
        let index = self.index_of(item)?;
        self.entries.remove(index);
        Ok(())
    }

    /// Replaces the first entry mapping `item` with padding of the same
    /// width. The position of every other entry is preserved.
    pub fn transform_to_padding(&mut self, item: &DictionaryItem) -> Result<(), FsoeError> {
        self.check_editable()?;
        let index = self.index_of(item)?;
        self.entries[index] = MappedEntry::Padding(item.bits());
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), FsoeError> {
        self.check_editable()?;
        self.entries.clear();
        Ok(())
    }

    /// Coalesces consecutive paddings into a single one.
    pub fn merge_adjacent_paddings(&mut self) -> Result<(), FsoeError> {
        self.check_editable()?;
        let mut merged: Vec<MappedEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if let (Some(MappedEntry::Padding(previous)), MappedEntry::Padding(bits)) =
                (merged.last_mut(), &entry)
            {
                *previous += *bits;
                continue;
            }
            merged.push(entry);
        }
        self.entries = merged;
        Ok(())
    }

    /// Pads the map so the last safe data block is full: one byte if the
    /// whole payload fits in a byte, otherwise a multiple of 16 bits.
    pub fn complete_with_padding(&mut self) -> Result<(), FsoeError> {
        self.check_editable()?;
        let total = self.safety_bits();
        let target = if total <= C_FSOE_SHORT_SLOT_WIDTH {
            C_FSOE_SHORT_SLOT_WIDTH
        } else {
            align_up(total, C_FSOE_SLOT_WIDTH)
        };
        if target > total {
            my_debug!(self.role, "Completing map with {} padding bits", target - total);
            self.entries.push(MappedEntry::Padding(target - total));
        }
        Ok(())
    }

    /// Independent copy of the entry sequence. Items stay shared.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn item(name: &str, key: u32, data_type: DataType) -> Arc<DictionaryItem> {
        Arc::new(DictionaryItem::input_output(name, key, data_type))
    }

    #[test]
    fn test_positions_are_contiguous() {
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&item("A", 1, DataType::Bool)).unwrap();
        map.add_padding(7).unwrap();
        map.add(&item("B", 2, DataType::UInt16)).unwrap();

        let positions: Vec<_> = map.iter().map(|(p, e)| (p, e.bits())).collect();
        assert_eq!(positions, [(0, 1), (1, 7), (8, 16)]);
        assert_eq!(map.safety_bits(), 24);
        assert_eq!(map.position_bits(2), Some(8));
        assert_eq!(map.position_bits(3), None);
    }

    #[test]
    fn test_add_rejects_wrong_kind() {
        let mut outputs = DictionaryMap::new(MapRole::Outputs);
        let input = Arc::new(DictionaryItem::input("IN", 1, DataType::Bool));
        assert_eq!(
            outputs.add(&input).unwrap_err(),
            FsoeError::KindMismatch {
                item: "IN".into(),
                role: MapRole::Outputs
            }
        );

        let mut inputs = DictionaryMap::new(MapRole::Inputs);
        let output = Arc::new(DictionaryItem::output("OUT", 2, DataType::Bool));
        assert!(matches!(
            inputs.add(&output),
            Err(FsoeError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_locked_map_rejects_every_mutation() {
        let a = item("A", 1, DataType::Bool);
        let mut map = DictionaryMap::new(MapRole::Inputs);
        map.add(&a).unwrap();
        map.lock();
        assert!(!map.editable());

        let locked = Err(FsoeError::MappingLocked(MapRole::Inputs));
        assert_eq!(map.add(&a).map(|_| ()), locked);
        assert_eq!(map.add_padding(8).map(|_| ()), locked);
        assert_eq!(map.remove(&a), locked);
        assert_eq!(map.transform_to_padding(&a), locked);
        assert_eq!(map.clear(), locked);
        assert_eq!(map.merge_adjacent_paddings(), locked);
        assert_eq!(map.complete_with_padding(), locked);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_width_is_bounded() {
        let overflow = |bits| {
            Err(FsoeError::MapOverflow {
                role: MapRole::Outputs,
                bits,
            })
        };
        let mut padded = DictionaryMap::new(MapRole::Outputs);
        assert_eq!(padded.add_padding(u16::MAX).map(|_| ()), overflow(0xFFFF));
        padded.add_padding(C_FSOE_MAX_MAP_BITS - 8).unwrap();
        padded.add_padding(8).unwrap();
        assert_eq!(padded.add_padding(1).map(|_| ()), overflow(0x8001));
        assert_eq!(padded.add(&item("A", 1, DataType::Bool)).map(|_| ()), overflow(0x8001));
        padded.merge_adjacent_paddings().unwrap();
        assert_eq!(padded.entries(), [MappedEntry::Padding(C_FSOE_MAX_MAP_BITS)]);

        // No free padding left, so inserting has to append.
        let word = item("W", 2, DataType::UInt16);
        let mut full = DictionaryMap::new(MapRole::Outputs);
        for _ in 0..C_FSOE_MAX_MAP_BITS / 16 {
            full.add(&word).unwrap();
        }
        let bit = item("B", 3, DataType::Bool);
        assert_eq!(full.insert_in_best_position(&bit, 1).map(|_| ()), overflow(0x8001));
        assert_eq!(full.safety_bits(), C_FSOE_MAX_MAP_BITS);
        assert!(!full.contains(&bit));
    }

    #[test]
    fn test_remove_compacts_and_transform_keeps_offsets() {
        let a = item("A", 1, DataType::UInt8);
        let b = item("B", 2, DataType::UInt8);
        let c = item("C", 3, DataType::UInt16);

        let mut removed = DictionaryMap::new(MapRole::Outputs);
        for i in [&a, &b, &c] {
            removed.add(i).unwrap();
        }
        let mut transformed = removed.copy();

        removed.remove(&b).unwrap();
        assert_eq!(removed.position_of(&c), Some(8));

        transformed.transform_to_padding(&b).unwrap();
        assert_eq!(transformed.position_of(&c), Some(16));
        assert_eq!(transformed.entries()[1], MappedEntry::Padding(8));

        assert_eq!(removed.remove(&b), Err(FsoeError::ItemNotFound("B".into())));
        assert_eq!(
            transformed.transform_to_padding(&b),
            Err(FsoeError::ItemNotFound("B".into()))
        );
    }

    #[test]
    fn test_merge_adjacent_paddings_is_idempotent() {
        let a = item("A", 1, DataType::Bool);
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add_padding(1).unwrap();
        map.add_padding(2).unwrap();
        map.add(&a).unwrap();
        map.add_padding(3).unwrap();
        map.add_padding(4).unwrap();
        map.add_padding(5).unwrap();

        map.merge_adjacent_paddings().unwrap();
        let once = map.clone();
        map.merge_adjacent_paddings().unwrap();

        assert_eq!(map, once);
        assert_eq!(
            map.entries(),
            [
                MappedEntry::Padding(3),
                MappedEntry::Item(a),
                MappedEntry::Padding(12)
            ]
        );
    }

    #[test]
    fn test_complete_with_padding() {
        let mut empty = DictionaryMap::new(MapRole::Outputs);
        empty.complete_with_padding().unwrap();
        assert_eq!(empty.entries(), [MappedEntry::Padding(8)]);

        let mut byte = DictionaryMap::new(MapRole::Outputs);
        byte.add(&item("A", 1, DataType::UInt8)).unwrap();
        byte.complete_with_padding().unwrap();
        assert_eq!(byte.len(), 1);

        let mut wide = DictionaryMap::new(MapRole::Outputs);
        wide.add(&item("A", 1, DataType::UInt8)).unwrap();
        wide.add(&item("B", 2, DataType::Bool)).unwrap();
        wide.complete_with_padding().unwrap();
        assert_eq!(wide.safety_bits(), 16);
        assert_eq!(wide.entries()[2], MappedEntry::Padding(7));

        wide.complete_with_padding().unwrap();
        assert_eq!(wide.len(), 3);
    }

    #[test]
    fn test_copy_shares_items() {
        let a = item("A", 1, DataType::Bool);
        let mut map = DictionaryMap::new(MapRole::Outputs);
        map.add(&a).unwrap();
        let mut copy = map.copy();
        copy.clear().unwrap();

        assert_eq!(map.len(), 1);
        assert!(copy.is_empty());
        assert_eq!(Arc::strong_count(&a), 2);
    }
}
